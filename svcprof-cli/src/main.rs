//! svcprof binary entry point

use anyhow::Result;
use clap::Parser;
use svcprof_cli::commands::{Cli, Commands, handle_profile_command};

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Profile(args) => handle_profile_command(args, &cli.global).await?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
