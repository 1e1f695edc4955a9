//! CLI surface (spec.md §6).

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "semadrawd", version, about = "SemaDraw display-server daemon")]
pub struct Args {
    /// Local socket path. Defaults to `/var/run/semadraw.sock`.
    #[arg(long = "socket")]
    pub socket: Option<String>,

    /// Optional `semadraw.toml` path (overrides discovery).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Rasterization backend. Only `headless` is implemented in this
    /// workspace; the others are external collaborators (spec.md §1).
    #[arg(long = "backend", value_enum)]
    pub backend: Option<BackendKind>,

    /// Network listener port. Omit to disable the network transport.
    #[arg(long = "tcp")]
    pub tcp_port: Option<u16>,

    /// Network listener bind address.
    #[arg(long = "tcp-addr")]
    pub tcp_addr: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum BackendKind {
    Software,
    Headless,
    Kms,
    X11,
    Vulkan,
    Wayland,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Headless => "headless",
            Self::Kms => "kms",
            Self::X11 => "x11",
            Self::Vulkan => "vulkan",
            Self::Wayland => "wayland",
        }
    }
}
