// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod sources;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::version;

/// Morning digest source CLI
#[derive(Parser, Debug)]
#[command(name = "digest-sources")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Check and exercise the morning digest content sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show registered sources and whether they are usable
    Sources(sources::SourcesArgs),

    /// Fetch items for a category with fallback
    Fetch(sources::FetchArgs),

    /// Free-text search through Tavily
    Search(sources::SearchArgs),

    /// Show build version and enabled features
    Version(VersionArgs),
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Print version info as JSON
    #[arg(long)]
    pub json: bool,
}

fn show_version(args: VersionArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
    } else {
        println!("{}", version::get_version_string());
        println!("Build: {}", version::VERSION);
        println!("Features: {}", version::FEATURES.join(", "));
    }
    Ok(())
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sources(args) => sources::show_sources(args).await,
        Commands::Fetch(args) => sources::fetch(args).await,
        Commands::Search(args) => sources::search(args).await,
        Commands::Version(args) => show_version(args),
    }
}
