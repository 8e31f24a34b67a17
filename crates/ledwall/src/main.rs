mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ledwall_core::Controller;

use crate::cli::{Cli, Command};
use crate::error::CliError;

// The core is driven cooperatively from one thread.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(ref args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ledwall", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let device_config = config::build_device_config(&cli.global, &cfg)?;
            tracing::debug!(
                base_url = %device_config.base_url,
                ws_url = %device_config.ws_url,
                client = ?device_config.client_build.label(),
                "device configured"
            );
            let controller = Controller::new(device_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &controller, &cli.global).await
        }
    }
}
