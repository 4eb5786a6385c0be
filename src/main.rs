//! Kiln - a static site build runner with a live-reloading dev server.

mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod pipeline;
mod registry;
mod reload;
mod runner;
mod serve;
mod transform;
mod utils;
mod watch;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::KilnConfig;
use pipeline::Pipeline;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = KilnConfig::load(&cli)?;
    debug!("config"; "root: {}", config.root.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        match cli.command() {
            Commands::Html { .. } => pipeline::serve(Pipeline::Html, &config).await,
            Commands::Template { .. } => pipeline::serve(Pipeline::Template, &config).await,
            Commands::Build { template: false } => pipeline::build(Pipeline::Html, &config).await,
            Commands::Build { template: true } => pipeline::build(Pipeline::Template, &config).await,
        }
    })
}
