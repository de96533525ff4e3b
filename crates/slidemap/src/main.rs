mod app;
mod cli;
mod commands;
mod config;
mod deck;
mod effects;
mod error;
mod input;
mod locate;
mod logger;
mod map;
mod nav;
mod session;
mod theme;

use clap::Parser;
use cli::Cli;
use colored::Colorize;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose, cli.quiet, cli.no_color);

    if let Err(e) = cli.run() {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }
}
