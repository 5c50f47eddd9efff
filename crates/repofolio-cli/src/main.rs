use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repofolio_api::{BadgeClient, Dispatcher, GithubClient};
use repofolio_cache::CacheStore;
use repofolio_core::{
    aggregate::GridOptions, overrides, AppConfig, Aggregator, BadgeFetcher, Fetcher, GithubSource,
    OrgCard, OrgCardConfig, SortMode, TopicBudget,
};

#[derive(Parser)]
#[command(name = "repofolio")]
#[command(version, about = "Aggregate a profile's repositories into one curated view", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch everything and print the grid plus organization cards
    Show {
        /// Username whose public repos feed the grid (overrides config)
        #[arg(long)]
        user: Option<String>,
    },
    /// Set and persist the grid sort mode (stars, name, updated)
    Sort {
        mode: String,
    },
    /// Print earned badges
    Badges {
        /// Badge provider username (overrides config)
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repofolio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let cache = open_cache(&config);

    let command = cli.command.unwrap_or(Commands::Show { user: None });
    match command {
        Commands::Sort { mode } => {
            let mode = SortMode::from_str(&mode).map_err(anyhow::Error::msg)?;
            cache.set_pref("sort-mode", mode.as_str());
            println!("Sort mode set to {}", mode);
            Ok(())
        }
        Commands::Badges { user } => {
            let user = user.unwrap_or_else(|| config.username.clone());
            show_badges(&config, cache, &user).await
        }
        Commands::Show { user } => {
            // Flag wins over config
            let user = user
                .or_else(|| (!config.username.is_empty()).then(|| config.username.clone()))
                .ok_or_else(|| {
                    anyhow::anyhow!("no username configured; pass --user or set it in config.toml")
                })?;
            show_all(&config, cache, &user).await
        }
    }
}

/// A broken cache store degrades to a throwaway in-memory one; the run
/// still works, just without persistence.
fn open_cache(config: &AppConfig) -> Arc<CacheStore> {
    match config.cache_db_path() {
        Ok(path) => match CacheStore::open(&path.to_string_lossy()) {
            Ok(store) => return Arc::new(store),
            Err(e) => tracing::warn!("cache unavailable, running without persistence: {}", e),
        },
        Err(e) => tracing::warn!("no cache directory, running without persistence: {}", e),
    }
    Arc::new(CacheStore::open_in_memory().expect("in-memory sqlite"))
}

async fn show_all(config: &AppConfig, cache: Arc<CacheStore>, user: &str) -> anyhow::Result<()> {
    let dispatcher = Dispatcher::new(config.dispatch.min_gap());
    let client = GithubClient::with_base_url(config.github.api_base.clone());
    let fetcher = Arc::new(Fetcher::new(
        Arc::new(GithubSource::new(client)),
        Arc::clone(&cache),
        dispatcher,
        config,
    ));

    let cards_config = config
        .sources
        .org_cards_path
        .as_deref()
        .map(load_org_cards)
        .unwrap_or_default();
    let manuals = config
        .sources
        .overrides_path
        .as_deref()
        .map(overrides::load_overrides)
        .unwrap_or_default();

    let sort = cache
        .get_pref("sort-mode")
        .and_then(|s| SortMode::from_str(&s).ok())
        .unwrap_or_default();
    let options = GridOptions {
        sort,
        ..GridOptions::default()
    };

    let budget = TopicBudget::new(config.topics.budget);
    let aggregator = Aggregator::new(fetcher, budget);
    let (grid, cards) = aggregator
        .run(user, &cards_config, manuals, &options)
        .await;

    println!("== Repositories ({}) ==", grid.status);
    for record in &grid.records {
        print_record(record);
    }

    for card in &cards {
        print_card(card);
    }
    Ok(())
}

async fn show_badges(config: &AppConfig, cache: Arc<CacheStore>, user: &str) -> anyhow::Result<()> {
    if user.is_empty() {
        anyhow::bail!("no badge username configured");
    }
    let dispatcher = Dispatcher::new(config.dispatch.min_gap());
    let client = BadgeClient::new(config.badges.proxy_base.clone());
    let fetcher = BadgeFetcher::new(client, cache, dispatcher, config);

    let badges = fetcher.badges(user).await?;
    println!("== Badges ({}) ==", badges.len());
    for badge in &badges {
        let issued = badge.issued_at.as_deref().unwrap_or("-");
        println!("  {} (issued {})", badge.badge_template.name, issued);
    }
    Ok(())
}

/// Missing or malformed card config means zero cards, not a fatal error.
fn load_org_cards(path: &Path) -> Vec<OrgCardConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("could not read org cards file {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(cards) => cards,
        Err(e) => {
            tracing::warn!("org cards file {} is malformed: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn print_record(record: &repofolio_core::RepoRecord) {
    let pin = if record.pinned { "*" } else { " " };
    let language = record.language.as_deref().unwrap_or("-");
    println!(
        "{} {:>6}  {:<40} {}",
        pin, record.stars, record.full_name, language
    );
    if let Some(ref description) = record.description {
        println!("           {}", description);
    }
    if !record.topics.is_empty() {
        println!("           [{}]", record.topics.join(", "));
    }
}

fn print_card(card: &OrgCard) {
    println!();
    println!("== {} ({}) ==", card.config.display_title(), card.status);
    if let Some(ref description) = card.config.description {
        println!("{}", description);
    }
    for record in &card.records {
        print_record(record);
    }
    if !card.topics.is_empty() {
        let chips: Vec<String> = card
            .topics
            .iter()
            .map(|t| format!("{} ({})", t.topic, t.count))
            .collect();
        println!("  topics: {}", chips.join(", "));
    }
    if card.config.show_view_all {
        println!("  view all: https://github.com/orgs/{}/repositories", card.config.org);
    }
}
