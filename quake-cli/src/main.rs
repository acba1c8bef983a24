//! quake-cli - Command line tool for the USGS earthquake feed.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "quake-cli",
    version,
    about = "Watch, export and summarise USGS earthquake events"
)]
struct Cli {
    #[command(subcommand)]
    command: quake_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("Starting quake-cli");
    quake_cmd::run(cli.command).await
}
