//! siteplan CLI application
//!
//! Command-line interface for analyzing websites and working through the
//! generated improvement plans.

mod args;
mod cli;
mod collaborators;
mod commands;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use siteplan_core::EngineBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        owner,
        collaborators,
        command,
    } = Args::parse();

    let mut builder = EngineBuilder::new();
    if let Some(path) = database_file {
        builder = builder.with_database_path(path);
    }

    let renderer = TerminalRenderer::new(!no_color);

    info!("siteplan started");

    let needs_collaborators = command
        .as_ref()
        .is_some_and(Commands::needs_collaborators);

    let cli = if needs_collaborators {
        let engine = collaborators::install(builder, &collaborators)?
            .build()
            .await
            .context("Failed to initialize engine")?;
        Cli::with_engine(engine, renderer, owner)
    } else {
        let stores = builder
            .build_stores()
            .await
            .context("Failed to open database")?;
        Cli::new(stores, renderer, owner)
    };

    cli.run(command).await
}
