use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use ipmi_viewer::config::LaunchConfig;
use ipmi_viewer::engine::orchestrator::{spawn_signal_listener, Launcher};
use ipmi_viewer::error::LaunchError;

mod cli;

use cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    init_tracing();

    let config = match LaunchConfig::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    let _signals = spawn_signal_listener(cancel.clone());

    let mut launcher = Launcher::new(config);
    match launcher.run(&cancel).await {
        Ok(report) => {
            debug!("run finished: {:?}", report.outcome);
            ExitCode::SUCCESS
        }
        Err(LaunchError::Interrupted) => {
            info!("Quitting!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", anyhow::Error::from(e));
            debug!("aborted in state {:?}", launcher.state());
            ExitCode::FAILURE
        }
    }
}
