mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = cli.config.as_deref();
    match cli.command {
        Command::Verify { object_id, phase } => {
            commands::verify(config, &object_id, phase).await
        }
        Command::Probe { object_id } => commands::probe(config, &object_id).await,
        Command::Render { variant, id } => commands::render(variant, id),
        Command::CheckExists { state, address } => {
            commands::check_exists(config, &state, &address).await
        }
        Command::CheckDestroy { state } => commands::check_destroy(config, &state).await,
        Command::Run { case, workdir, binary, local, json } => {
            commands::run(config, case.as_str(), workdir, binary, local, json).await
        }
    }
}
