//! Shopbot CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! shopbot migrate
//!
//! # Insert the demo catalog (idempotent)
//! shopbot seed demo
//!
//! # Wipe the catalog tables, then insert the demo catalog
//! shopbot seed demo --reset
//!
//! # Show the category names the assistant classifies against
//! shopbot categories
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopbot")]
#[command(author, version, about = "Shopbot CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Print the categories that currently have available products
    Categories,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert the demo catalog (categories, brands, five products)
    Demo {
        /// Truncate all catalog tables first
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Demo { reset } => commands::seed::demo(reset).await?,
        },
        Commands::Categories => commands::categories::list().await?,
    }
    Ok(())
}
