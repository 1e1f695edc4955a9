//! Parses the optional `semadraw.toml` configuration file (spec.md §6's CLI
//! surface, expanded per this workspace's ambient configuration story).
//! Every field is `#[serde(default)]` so an empty or partial file is valid;
//! a parse error falls back to defaults rather than aborting startup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use semadraw_session::ResourceLimits;
use serde::Deserialize;

pub const DEFAULT_SOCKET_PATH: &str = "/var/run/semadraw.sock";
pub const DEFAULT_TCP_PORT: u16 = 7234;
pub const DEFAULT_BACKLOG: i32 = 16;
pub const DEFAULT_TARGET_HZ: u32 = 60;
pub const DEFAULT_MAX_CLIENTS: u32 = 256;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ResourceLimitsFile {
    pub max_surfaces: Option<u32>,
    pub max_total_pixels: Option<u64>,
    pub max_sdcs_bytes: Option<u64>,
    pub max_shm_bytes: Option<u64>,
}

impl ResourceLimitsFile {
    fn resolve(&self) -> ResourceLimits {
        let defaults = ResourceLimits::default();
        ResourceLimits {
            max_surfaces: self.max_surfaces.unwrap_or(defaults.max_surfaces),
            max_total_pixels: self.max_total_pixels.unwrap_or(defaults.max_total_pixels),
            max_sdcs_bytes: self.max_sdcs_bytes.unwrap_or(defaults.max_sdcs_bytes),
            max_shm_bytes: self.max_shm_bytes.unwrap_or(defaults.max_shm_bytes),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub socket_path: Option<String>,
    #[serde(default)]
    pub tcp_addr: Option<String>,
    #[serde(default)]
    pub tcp_port: Option<u16>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub target_hz: Option<u32>,
    #[serde(default)]
    pub max_clients: Option<u32>,
    #[serde(default)]
    pub resource_limits: ResourceLimitsFile,
}

/// Fully resolved configuration, CLI overrides already merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub socket_path: PathBuf,
    pub tcp_bind: Option<(String, u16)>,
    pub backend: String,
    pub target_hz: u32,
    pub max_clients: u32,
    pub resource_limits: ResourceLimits,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    pub file: ConfigFile,
}

impl Config {
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Self { file }),
            Err(e) => {
                tracing::warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Ok(Self::default())
            }
        }
    }

    /// Applies CLI flags on top of the file's values; a `Some` override
    /// always wins over the file.
    pub fn resolve(&self, overrides: CliOverrides) -> ResolvedConfig {
        let socket_path = overrides
            .socket
            .or_else(|| self.file.socket_path.clone())
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());
        let tcp_port = overrides.tcp_port.or(self.file.tcp_port);
        let tcp_addr = overrides
            .tcp_addr
            .or_else(|| self.file.tcp_addr.clone())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let tcp_bind = tcp_port.map(|port| (tcp_addr, port));
        let backend = overrides
            .backend
            .or_else(|| self.file.backend.clone())
            .unwrap_or_else(|| "software".to_string());
        let target_hz = self.file.target_hz.unwrap_or(DEFAULT_TARGET_HZ);
        let max_clients = self.file.max_clients.unwrap_or(DEFAULT_MAX_CLIENTS);
        let resource_limits = self.file.resource_limits.resolve();

        ResolvedConfig {
            socket_path: PathBuf::from(socket_path),
            tcp_bind,
            backend,
            target_hz,
            max_clients,
            resource_limits,
        }
    }
}

/// CLI-flag values that, when present, override the config file
/// (spec.md §6).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub socket: Option<String>,
    pub backend: Option<String>,
    pub tcp_port: Option<u16>,
    pub tcp_addr: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load_from(None).unwrap();
        let resolved = cfg.resolve(CliOverrides::default());
        assert_eq!(resolved.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert_eq!(resolved.target_hz, DEFAULT_TARGET_HZ);
        assert_eq!(resolved.resource_limits, ResourceLimits::default());
    }

    #[test]
    fn partial_file_only_overrides_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semadraw.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "target_hz = 120").unwrap();
        let cfg = Config::load_from(Some(&path)).unwrap();
        let resolved = cfg.resolve(CliOverrides::default());
        assert_eq!(resolved.target_hz, 120);
        assert_eq!(resolved.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
    }

    #[test]
    fn cli_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semadraw.toml");
        std::fs::write(&path, "socket_path = \"/tmp/file.sock\"\n").unwrap();
        let cfg = Config::load_from(Some(&path)).unwrap();
        let overrides = CliOverrides { socket: Some("/tmp/cli.sock".into()), ..Default::default() };
        let resolved = cfg.resolve(overrides);
        assert_eq!(resolved.socket_path, PathBuf::from("/tmp/cli.sock"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semadraw.toml");
        std::fs::write(&path, "this is not valid toml =====").unwrap();
        let cfg = Config::load_from(Some(&path)).unwrap();
        let resolved = cfg.resolve(CliOverrides::default());
        assert_eq!(resolved.target_hz, DEFAULT_TARGET_HZ);
    }
}
