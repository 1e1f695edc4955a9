//! Structured logging and panic reporting: a non-blocking file appender plus
//! an `EnvFilter`-driven subscriber, and a `Once`-guarded panic hook that logs
//! before the default hook runs.

use std::path::Path;
use std::sync::Once;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

/// Configures a non-blocking file-backed `tracing` subscriber writing to
/// `semadraw.log` next to the current directory, honoring `RUST_LOG` via
/// `EnvFilter::from_default_env()`. Returns the `WorkerGuard` the caller must
/// hold for the process lifetime, or `None` if a subscriber was already
/// installed (e.g. under a test harness).
pub fn configure_logging() -> Result<Option<WorkerGuard>> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("semadraw.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "semadraw.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Ok(Some(guard)),
        Err(_err) => {
            // Global subscriber already installed; drop the guard so the
            // writer thread shuts down.
            Ok(None)
        }
    }
}

pub fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "daemon.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
