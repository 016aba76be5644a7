use std::io;
use std::process::ExitCode;

use clap::Parser;
use plan_app::app;
use plan_app::cli::Cli;
use plan_app::config::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?.with_cli(&cli);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app::run(&config, cli.command, &mut out)
}
