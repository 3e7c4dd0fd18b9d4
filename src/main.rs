use clap::Parser;
use tracing::warn;

use tributary::app::AppContext;
use tributary::cli::{commands, Cli, Commands};
use tributary::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    tributary::logging::init(&config.logging.level);
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Run {
            interval,
            no_initial_scrape,
        } => {
            commands::run(&ctx, interval.as_deref(), no_initial_scrape).await?;
        }
        Commands::Once => {
            commands::scrape_once(&ctx).await?;
        }
        Commands::Add { url } => {
            commands::add_feed(&ctx, &url).await?;
        }
        Commands::List { posts } => match posts {
            Some(url) => commands::list_posts(&ctx, &url)?,
            None => commands::list_feeds(&ctx)?,
        },
    }

    Ok(())
}
