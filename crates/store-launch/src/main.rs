//! store-launch: launch a store game at a chosen version

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launch_orchestration::Platform;
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

#[derive(Parser)]
#[command(name = "store-launch")]
#[command(about = "Launch a store game at a chosen version")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "launch.yaml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the install and launch the game
    Launch {
        /// Platform whose client the game belongs to
        #[arg(short, long)]
        platform: Platform,

        /// Version to launch
        #[arg(long = "game-version", value_name = "ID")]
        version: String,

        /// The version is the platform's own install
        #[arg(long)]
        native: bool,

        /// The files are not this platform's build flavour
        #[arg(long)]
        foreign_build: bool,

        /// Extra flags passed to the game
        #[arg(long = "flag", value_name = "FLAG", allow_hyphen_values = true)]
        flags: Vec<String>,
    },

    /// Put every platform's original install back
    Restore,

    /// Remove managed links from every platform library
    CleanLinks,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = launch_config::parse_file(&cli.config)
        .with_context(|| format!("Failed to parse configuration {}", cli.config.display()))?;
    logging::init(config.settings.log_level.as_deref(), cli.verbose);

    smol::block_on(async {
        match cli.command {
            Commands::Launch {
                platform,
                version,
                native,
                foreign_build,
                flags,
            } => {
                let request = commands::launch::Request {
                    platform,
                    version,
                    native,
                    platform_build: !foreign_build,
                    flags,
                };
                commands::launch::run(&config, request).await
            }
            Commands::Restore => commands::restore::run(&config).await,
            Commands::CleanLinks => commands::clean_links::run(&config).await,
            Commands::Validate => commands::validate::run(&cli.config, &config).await,
        }
    })
}
