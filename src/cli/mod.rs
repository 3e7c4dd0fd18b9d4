pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "A periodic RSS scraper", long_about = None)]
pub struct Cli {
    /// Path to a config file (default: ~/.config/tributary/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape on a schedule until interrupted
    Run {
        /// Override the scrape interval (e.g., "30m", "1h", "1d")
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the scrape that normally runs on startup
        #[arg(long)]
        no_initial_scrape: bool,
    },
    /// Run a single scrape cycle and exit
    Once,
    /// Add a new feed
    Add {
        /// URL of the feed to add
        url: String,
    },
    /// List feeds, or the posts of one feed
    List {
        /// Show posts of the feed with this URL
        #[arg(long, value_name = "URL")]
        posts: Option<String>,
    },
}
