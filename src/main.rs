mod cli;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sdui::telemetry::init_tracing("info");
    Cli::parse().run().await
}
