//! Permaroute - permalink rewrite rule compiler and resolver.

#![allow(dead_code)]

mod cli;
mod config;
mod engine;
mod logger;
mod render;
mod resolve;
mod store;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = SiteConfig::load(&cli.config)?;

    match &cli.command {
        Commands::Rules { json } => cli::rules::run_rules(*json, &config),
        Commands::Htaccess => cli::render::run_htaccess(&config),
        Commands::Webconfig { full } => cli::render::run_webconfig(*full, &config),
        Commands::Resolve { url } => cli::resolve::run_resolve(url, &config),
        Commands::Flush { hard } => cli::flush::run_flush(*hard, &config),
    }
}
