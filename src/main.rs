//! routemap - maintain resource locator route trees from the command line.

use anyhow::Result;
use clap::{ColorChoice, Parser};

use routemap::cli::{self, Cli};
use routemap::config::RouteConfig;
use routemap::{log, logger};

fn main() {
    if let Err(err) = try_main() {
        log!("error"; "{:#}", err);
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    logger::set_verbose(cli.verbose);

    let config = RouteConfig::load(&cli.config)?;
    if config.log.verbose {
        logger::set_verbose(true);
    }

    cli::run(&cli, &config)
}
