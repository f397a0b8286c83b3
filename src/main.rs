mod app;
mod cli;
mod config;
mod error;
mod http;
mod logging;
mod model;
mod paths;
mod store;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(cli.verbose);
    app::run(cli)
}
