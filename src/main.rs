//! Pokedex - browse the Generation 1 catalog from the terminal

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokedex_core::{
    is_known_category, normalize_category, CatalogConfig, Entity, FavoritesSet, FileBlobStore,
    FilterCriteria, HttpCatalogSource, TracingNotifier, ViewEngine, KNOWN_CATEGORIES,
};

/// Pokedex - filtered, paginated catalog browser
#[derive(Parser, Debug, Clone)]
#[command(name = "pokedex")]
#[command(about = "Browse the Generation 1 catalog with search, type and favorites filters")]
pub struct Args {
    /// Catalog API base URL
    #[arg(long, env = "POKEDEX_BASE_URL")]
    pub base_url: Option<String>,

    /// Entities per page
    #[arg(long, env = "POKEDEX_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Name prefix to search for (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only show favorites
    #[arg(long, default_value = "false")]
    pub favorites_only: bool,

    /// Type the entity must have; repeat to require several
    #[arg(long = "type", short = 't', value_parser = parse_category)]
    pub types: Vec<String>,

    /// Number of pages to load
    #[arg(long, default_value = "1")]
    pub pages: usize,

    /// Toggle an id in the favorites before listing; repeatable
    #[arg(long = "favorite", short = 'f')]
    pub favorites: Vec<u32>,

    /// Show the details of one entity (name or id) instead of listing
    #[arg(long)]
    pub lookup: Option<String>,

    /// Directory the favorites are persisted in
    #[arg(long, env = "POKEDEX_FAVORITES_DIR", default_value = ".pokedex")]
    pub favorites_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Filter criteria requested on the command line
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_prefix: self.search.clone().unwrap_or_default(),
            favorites_only: self.favorites_only,
            categories: self.types.iter().cloned().collect(),
        }
    }

    /// Merge CLI overrides into the environment-derived config
    pub fn catalog_config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::from_env();
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.trim_end_matches('/'));
        }
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        config
    }
}

fn parse_category(value: &str) -> Result<String, String> {
    if is_known_category(value) {
        Ok(normalize_category(value))
    } else {
        Err(format!(
            "unknown type '{}', expected one of: {}",
            value,
            KNOWN_CATEGORIES.join(", ")
        ))
    }
}

fn render_row(entity: &Entity, favorite: bool) -> String {
    format!(
        "{} #{:03} {:<12} {}",
        if favorite { "*" } else { " " },
        entity.id,
        entity.name,
        entity.categories.join("/")
    )
}

fn render_details(entity: &Entity, favorite: bool) -> String {
    let mut out = format!(
        "#{:03} {}{}\n  types:  {}\n  height: {:.1} m\n  weight: {:.1} kg\n",
        entity.id,
        entity.name,
        if favorite { " (favorite)" } else { "" },
        entity.categories.join(", "),
        f64::from(entity.height) / 10.0,
        f64::from(entity.weight) / 10.0,
    );
    for stat in &entity.stats {
        out.push_str(&format!("  {:<16} {}\n", stat.name, stat.value));
    }
    for t in &entity.traits {
        out.push_str(&format!(
            "  ability: {}{}\n",
            t.name,
            if t.hidden { " (hidden)" } else { "" }
        ));
    }
    if !entity.sprite_url.is_empty() {
        out.push_str(&format!("  artwork: {}\n", entity.sprite_url));
    }
    out
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pokedex={},pokedex_core={},warn", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.catalog_config();
    info!("Catalog: {} (universe 1..={})", config.base_url, config.universe_size);

    let source = HttpCatalogSource::new(&config).context("failed to build HTTP client")?;
    let store = FileBlobStore::new(&args.favorites_dir);
    let engine = ViewEngine::new(
        &config,
        Arc::new(source),
        Arc::new(FavoritesSet::with_store(Arc::new(store))),
        Arc::new(TracingNotifier),
    );
    let favorites = engine.favorites();

    for id in &args.favorites {
        let now_favorite = favorites.toggle(*id);
        info!("Favorite {}: {}", id, now_favorite);
    }

    if let Some(query) = &args.lookup {
        let entity = match query.trim().parse::<u32>() {
            Ok(id) => engine.lookup_by_id(id).await,
            Err(_) => engine.lookup_by_name(query).await,
        }
        .with_context(|| format!("lookup of '{}' failed", query))?;
        print!("{}", render_details(&entity, favorites.is_favorite(entity.id)));
        return Ok(());
    }

    // Filters are recorded before initialization so only the filtered
    // first page is fetched.
    engine.set_criteria(args.criteria()).await;
    engine.initialize().await;

    for _ in 1..args.pages {
        if !engine.has_more().await {
            break;
        }
        engine.load_more().await;
    }

    if let Some(error) = engine.error().await {
        warn!("{}", error);
    }

    let shown = engine.entities().await;
    for entity in &shown {
        println!("{}", render_row(entity, favorites.is_favorite(entity.id)));
    }

    let total = engine.filtered_ids().await.len();
    println!(
        "\nShowing {} of {}{}",
        shown.len(),
        total,
        if engine.has_more().await {
            format!(" ({} per page, use --pages for more)", engine.page_size())
        } else {
            String::new()
        }
    );

    if let Some(error) = engine.error().await {
        anyhow::bail!(error);
    }
    Ok(())
}
