use anyhow::Result;
use clap::Parser;

mod cli;
mod client;
mod config;
mod dataset;
mod params;
mod plot;
mod render;
mod session;
mod strategy;
mod table;
mod tui;
mod util;
mod workflow;

use cli::{Command, RootArgs};
use config::Config;

fn main() -> Result<()> {
    init_tracing();
    let cli = RootArgs::parse();
    match cli.command {
        Command::Run(args) => {
            let config = Config::resolve(args.endpoint, args.leads, args.out_dir)?;
            tui::run(config)
        }
        Command::Analyze(args) => workflow::run_analyze(args),
    }
}

/// Logs go to stderr: the TUI owns the terminal and `analyze` owns stdout.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
