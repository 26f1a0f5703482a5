mod app;
mod cli;
mod cluster;
mod color;
mod data;
mod error;
mod perturb;
mod render;
mod similarity;

use clap::Parser;
use env_logger::Env;

use cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let written = match &cli.command {
        Command::Plot(args) => app::run_plot(args)?,
        Command::Simulate(args) => app::run_simulate(args)?,
        Command::Export(args) => app::run_export(args)?,
    };
    log::debug!("{} file(s) written", written.len());
    Ok(())
}
