//! POLYEDGE — Prediction Market Decision Pipeline
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the platform client, screener, forecaster, and sizer together,
//! and runs the selected command: a one-best-trade session or a batch
//! recommendation scan.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use polyedge::cache::{DirCache, SessionCache};
use polyedge::config::AppConfig;
use polyedge::engine::funnel::MarketFunnel;
use polyedge::engine::recommend::RecommendEngine;
use polyedge::engine::session::{SessionConfig, TradeSession};
use polyedge::forecast::openai::OpenAiForecaster;
use polyedge::platforms::polymarket::PolymarketClient;
use polyedge::screen::{ScreenConfig, TradeabilityScreener};
use polyedge::storage::ResultStore;
use polyedge::strategy::sizing::{FixedFractionSizer, SizingConfig};

const BANNER: &str = r#"
 ____   ___  _  __   _______ ____   ____ _____
|  _ \ / _ \| | \ \ / / ____|  _ \ / ___| ____|
| |_) | | | | |  \ V /|  _| | | | | |  _|  _|
|  __/| |_| | |___| | | |___| |_| | |_| | |___
|_|    \___/|_____|_| |_____|____/ \____|_____|

  Prediction Market Decision Pipeline
"#;

#[derive(Parser)]
#[command(name = "polyedge", about = "Prediction market decision pipeline", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full trade session: funnel to a single best trade.
    Trade,
    /// Score a batch of markets and rank them by edge.
    Recommend {
        /// Maximum markets to score.
        #[arg(long, default_value_t = 5)]
        limit: u32,
        /// Edge (percentage points) required for a BUY signal.
        #[arg(long)]
        min_edge: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli.config)?;

    init_logging();

    println!("{BANNER}");
    info!(agent_name = %cfg.agent.name, "POLYEDGE starting up");

    let source = Arc::new(PolymarketClient::new()?);

    let api_key = AppConfig::resolve_env(&cfg.forecast.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        warn!(env = %cfg.forecast.api_key_env, "No forecast API key configured");
    }
    let forecaster = Arc::new(OpenAiForecaster::new(
        api_key,
        Some(cfg.forecast.model.clone()),
        Some(cfg.forecast.max_tokens),
    )?);

    match cli.command {
        Command::Trade => {
            let screener = Arc::new(TradeabilityScreener::new(ScreenConfig {
                min_price: cfg.markets.min_price,
                max_price: cfg.markets.max_price,
                max_spread: cfg.markets.max_spread,
            }));
            let sizer = Arc::new(FixedFractionSizer::new(SizingConfig {
                bankroll: cfg.trading.bankroll,
                stake_fraction: cfg.trading.stake_fraction,
                min_stake: cfg.trading.min_stake,
            }));
            let cache: Arc<dyn SessionCache> = Arc::new(DirCache::new(
                cfg.agent.cache_dirs.iter().map(PathBuf::from).collect(),
            ));

            let session = TradeSession::new(
                MarketFunnel::new(source, screener),
                sizer,
                cache,
                ResultStore::new(&cfg.agent.results_dir),
                SessionConfig {
                    max_attempts: cfg.agent.max_attempts,
                    base_backoff_ms: cfg.agent.base_backoff_ms,
                },
            );

            let record = session.run().await?;
            info!(
                trade = %record.best_trade.as_deref().unwrap_or("-"),
                "Session complete"
            );
        }
        Command::Recommend { limit, min_edge } => {
            let min_edge = min_edge.unwrap_or(cfg.trading.min_edge);
            let engine = RecommendEngine::new(source, forecaster)
                .with_concurrency(cfg.forecast.concurrency)
                .with_forecast_timeout(Duration::from_secs(cfg.forecast.timeout_secs));

            let batch = engine.recommend(limit, min_edge).await?;

            ResultStore::new(&cfg.agent.results_dir).save(
                "recommend",
                &batch,
                serde_json::json!({ "limit": limit, "min_edge": min_edge }),
            )?;

            for rec in batch.top_buys() {
                println!("{rec}");
            }
            info!(
                analyzed = batch.total_markets_analyzed,
                recommendations = batch.recommendations.len(),
                "Recommendation scan complete"
            );
        }
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polyedge=info"));

    let json_logging = std::env::var("POLYEDGE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
