use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use headline::app_state::AppState;
use headline::config::{Config, feed_catalog};
use headline::telemetry;

/// One-shot operations against the news store.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge the built-in feed catalog into the store
    Seed,
    /// Ingest all active feeds, or a single feed by name
    Fetch {
        #[arg(long)]
        feed: Option<String>,
    },
    /// Enrich one article, addressed by slug or id
    Enrich { key: String },
    /// Enrich articles that have no content yet
    Sweep {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Feed source administration
    Feeds {
        #[command(subcommand)]
        action: FeedAction,
    },
    /// Remove stored articles and fetch logs
    Cleanup {
        #[command(subcommand)]
        target: CleanupTarget,
    },
    /// Reset one article's content and image so it is enriched again
    ClearContent { key: String },
    /// Most recent fetch log rows
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum FeedAction {
    Toggle { name: String },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum CleanupTarget {
    Feed { name: String },
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    let state = AppState::connect(config).await?;

    match cli.command {
        Command::Seed => print_json(&state.admin.seed_catalog(&feed_catalog()).await?),
        Command::Fetch { feed: Some(name) } => {
            print_json(&state.ingestor.fetch_feed_by_name(&name).await?)
        }
        Command::Fetch { feed: None } => print_json(&state.ingestor.fetch_all_feeds().await?),
        Command::Enrich { key } => print_json(&state.enricher.extract_and_apply(&key).await?),
        Command::Sweep { limit } => {
            let limit = limit.unwrap_or(state.config.enrich_batch_size);
            print_json(&state.enricher.enrich_missing(limit).await?)
        }
        Command::Feeds {
            action: FeedAction::Toggle { name },
        } => match state.admin.toggle_feed(&name).await? {
            Some(feed) => print_json(&feed),
            None => bail!("feed source not found: {}", name),
        },
        Command::Feeds {
            action: FeedAction::Delete { name },
        } => {
            if !state.admin.delete_feed(&name).await? {
                bail!("feed source not found: {}", name);
            }
            print_json(&serde_json::json!({ "deleted": name }))
        }
        Command::Cleanup {
            target: CleanupTarget::Feed { name },
        } => print_json(&state.admin.cleanup_feed(&name).await?),
        Command::Cleanup {
            target: CleanupTarget::All,
        } => print_json(&state.admin.cleanup_all().await?),
        Command::ClearContent { key } => {
            let id = state.admin.clear_content(&key).await?;
            print_json(&serde_json::json!({ "cleared": id }))
        }
        Command::Logs { limit } => print_json(&state.admin.fetch_logs(limit).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
