//! properti: command-line front end for the hybrid property search engine.
//!
//! Runs searches against PostgreSQL (or the built-in sample catalogue with
//! `--demo`), and inspects the analytics recorder configured through
//! `SEARCH_ANALYTICS_FILE`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use properti_core::{ListingFilters, ListingStore, SearchOptions, SearchQuery, SortMode};
use properti_db::{log_pool_metrics, test_fixtures, Database, InMemoryListingStore, PoolConfig};
use properti_search::{
    validate, AnalyticsConfig, PersistenceWarning, SearchAnalytics, SearchEngine,
    SearchEngineConfig,
};

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/properti";
const DEFAULT_LOG_FILTER: &str = "properti=info,properti_search=info,properti_db=warn";
const CLI_SOURCE: &str = "cli";

#[derive(Parser, Debug)]
#[command(name = "properti")]
#[command(author, version, about = "Hybrid property listing search")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search listings (full-text, then hybrid, then fallback)
    Search(SearchArgs),

    /// Check a search term without running it
    Validate {
        /// Raw search term
        term: String,
    },

    /// Suggest terms from recent and popular searches
    Suggest {
        /// Partial term typed so far (empty for the default list)
        #[arg(default_value = "")]
        partial: String,
    },

    /// Print aggregate search statistics
    Stats,

    /// Export history, popular terms and stats as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forget all recorded searches
    Clear,

    /// Apply pending database migrations
    Migrate,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Search term, e.g. "rumah sleman 500 juta" or "R8.01"
    term: String,

    /// Page size
    #[arg(short, long)]
    limit: Option<i64>,

    /// Page offset
    #[arg(short, long)]
    offset: Option<i64>,

    /// Ordering: relevance, date or price
    #[arg(short, long, default_value = "relevance")]
    sort: SortMode,

    /// Include sold listings
    #[arg(long)]
    include_sold: bool,

    /// Exact property type filter
    #[arg(long = "type")]
    property_type: Option<String>,

    /// Exact status filter
    #[arg(long)]
    status: Option<String>,

    /// Inclusive minimum price
    #[arg(long)]
    min_price: Option<i64>,

    /// Inclusive maximum price
    #[arg(long)]
    max_price: Option<i64>,

    /// Per-query datastore timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Source tag recorded with the search
    #[arg(long, default_value = CLI_SOURCE)]
    source: String,

    /// Search the built-in sample catalogue instead of the database
    #[arg(long)]
    demo: bool,
}

impl SearchArgs {
    fn options(&self) -> SearchOptions {
        let mut filters = ListingFilters::new().with_price_range(self.min_price, self.max_price);
        if let Some(ref jenis) = self.property_type {
            filters = filters.with_property_type(jenis.clone());
        }
        if let Some(ref status) = self.status {
            filters = filters.with_status(status.clone());
        }

        let mut options = SearchOptions::new()
            .with_filters(filters)
            .with_sort(self.sort)
            .with_include_sold(self.include_sold);
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(offset) = self.offset {
            options = options.with_offset(offset);
        }
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        options
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter
///
/// Console output goes to stderr so command output on stdout stays parseable.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("properti.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        subsystem = "cli",
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );

    guard
}

fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

async fn connect() -> anyhow::Result<Database> {
    info!(subsystem = "cli", "Connecting to database...");
    let db = Database::connect_with_config(&database_url(), PoolConfig::from_env())
        .await
        .context("failed to connect to the listing database")?;
    info!(subsystem = "cli", "Database connected");
    log_pool_metrics(&db.pool);
    Ok(db)
}

fn log_persistence_warning(warning: Option<PersistenceWarning>) {
    if let Some(w) = warning {
        warn!(
            subsystem = "cli",
            operation = w.operation,
            store = w.store,
            error = %w.message,
            "Analytics persistence failed, continuing in memory"
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_search(args: SearchArgs, analytics: Arc<SearchAnalytics>) -> anyhow::Result<()> {
    let store: Arc<dyn ListingStore> = if args.demo {
        Arc::new(InMemoryListingStore::new().with_listings(test_fixtures::sample_listings()))
    } else {
        Arc::new(connect().await?.listings)
    };

    let engine = SearchEngine::with_config(store, SearchEngineConfig::from_env())
        .with_analytics(analytics);

    let query = SearchQuery::new(args.term.clone())
        .with_options(args.options())
        .with_source(args.source.clone());
    let response = engine.execute(query).await?;
    print_json(&response)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Migrate = cli.command {
        let db = connect().await?;
        info!(subsystem = "cli", "Running database migrations...");
        db.migrate().await?;
        info!(subsystem = "cli", "Database migrations complete");
        return Ok(());
    }
    if let Commands::Validate { ref term } = cli.command {
        return print_json(&validate(term));
    }

    let (analytics, warning) = SearchAnalytics::from_config(AnalyticsConfig::from_env()).await;
    log_persistence_warning(warning);
    let analytics = Arc::new(analytics);

    match cli.command {
        Commands::Search(args) => cmd_search(args, analytics).await?,
        Commands::Suggest { partial } => print_json(&analytics.suggestions(&partial).await)?,
        Commands::Stats => print_json(&analytics.stats().await)?,
        Commands::Export { output } => {
            let export = analytics.export().await;
            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&export)?;
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(subsystem = "cli", path = %path.display(), "Analytics exported");
                }
                None => print_json(&export)?,
            }
        }
        Commands::Clear => {
            let receipt = analytics.clear().await;
            log_persistence_warning(receipt.persistence_warning);
        }
        Commands::Migrate | Commands::Validate { .. } => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_build_options() {
        let cli = Cli::try_parse_from([
            "properti",
            "search",
            "rumah sleman",
            "--limit",
            "5",
            "--offset",
            "10",
            "--sort",
            "price",
            "--include-sold",
            "--type",
            "Rumah",
            "--min-price",
            "100000000",
            "--timeout-ms",
            "250",
        ])
        .unwrap();

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.term, "rumah sleman");
        assert_eq!(args.source, CLI_SOURCE);
        assert!(!args.demo);

        let options = args.options();
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.offset, Some(10));
        assert_eq!(options.sort_by, SortMode::Price);
        assert!(options.include_sold);
        assert_eq!(options.filters.jenis_properti.as_deref(), Some("Rumah"));
        assert_eq!(options.filters.min_price, Some(100_000_000));
        assert_eq!(options.filters.max_price, None);
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_search_defaults_leave_options_unset() {
        let cli = Cli::try_parse_from(["properti", "search", "R8.01", "--demo"]).unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert!(args.demo);

        let options = args.options();
        assert_eq!(options.limit, None);
        assert_eq!(options.offset, None);
        assert_eq!(options.sort_by, SortMode::Relevance);
        assert!(!options.include_sold);
        assert!(options.filters.is_empty());
    }

    #[test]
    fn test_unknown_sort_mode_is_rejected() {
        assert!(Cli::try_parse_from(["properti", "search", "rumah", "--sort", "random"]).is_err());
    }

    #[test]
    fn test_suggest_partial_defaults_to_empty() {
        let cli = Cli::try_parse_from(["properti", "suggest"]).unwrap();
        assert!(matches!(cli.command, Commands::Suggest { ref partial } if partial.is_empty()));
    }

    #[test]
    fn test_export_output_path() {
        let cli = Cli::try_parse_from(["properti", "export", "-o", "analytics.json"]).unwrap();
        match cli.command {
            Commands::Export { output } => {
                assert_eq!(output, Some(PathBuf::from("analytics.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
