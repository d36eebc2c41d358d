//! ## eventsim
//! **Session event simulator**
//!
//! `eventsim run` simulates client sessions and publishes their events to the
//! configured sink. `eventsim plan` prints what a seed would produce without
//! running anything.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    commands::run_command(Cli::parse()).await
}
