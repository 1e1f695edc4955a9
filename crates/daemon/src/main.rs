//! `semadrawd` entry point: parses arguments, loads configuration, binds the
//! listeners, and runs the event loop. Kept thin; startup/shutdown concerns
//! live in their own modules.

mod args;
mod client;
mod clipboard;
mod dispatch;
mod event;
mod logging;
mod runtime;
mod shm;

use clap::Parser;

use args::{Args, BackendKind};
use semadraw_config::{CliOverrides, Config};

fn main() {
    let args = Args::parse();

    let _log_guard = match logging::configure_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to configure logging: {e}");
            std::process::exit(1);
        }
    };
    logging::install_panic_hook();

    if let Err(e) = run(args) {
        tracing::error!(target: "daemon", error = %e, "fatal");
        eprintln!("semadrawd: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let backend = args.backend.unwrap_or(BackendKind::Headless);
    if backend != BackendKind::Headless {
        anyhow::bail!(
            "backend '{}' is not implemented by this workspace; only 'headless' is available (spec.md §1)",
            backend.as_str()
        );
    }

    let config_file = Config::load_from(args.config.as_deref())?;
    let overrides = CliOverrides {
        socket: args.socket,
        backend: Some(backend.as_str().to_string()),
        tcp_port: args.tcp_port,
        tcp_addr: args.tcp_addr,
    };
    let resolved = config_file.resolve(overrides);

    tracing::info!(
        target: "daemon",
        socket = %resolved.socket_path.display(),
        tcp = ?resolved.tcp_bind,
        max_clients = resolved.max_clients,
        target_hz = resolved.target_hz,
        "starting"
    );

    let mut runtime = runtime::Runtime::new(resolved)?;
    runtime.run()
}
