//! `tls13-server`: accept a TLS 1.3 connection, print what was negotiated,
//! then echo or answer one HTTP request.

use std::process::ExitCode;

use clap::Parser;

use tls13_demo_server::config::cli::Cli;
use tls13_demo_server::config::validation::validate_config;
use tls13_demo_server::lifecycle::{signals, startup, Shutdown};
use tls13_demo_server::observability::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tls13-server starting");

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!("{error}");
        }
        return ExitCode::FAILURE;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    match startup::run(&config, &shutdown).await {
        Ok(stats) => {
            tracing::info!(
                sessions = stats.sessions_finished,
                accept_errors = stats.accept_errors,
                "Shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
