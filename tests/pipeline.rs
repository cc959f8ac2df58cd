//! End-to-end pipeline tests.
//!
//! Exercises the full decision pipeline against a deterministic
//! in-memory market source and canned forecaster. All state is local;
//! no network, no real LLM.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use polyedge::cache::SessionCache;
use polyedge::engine::funnel::MarketFunnel;
use polyedge::engine::recommend::RecommendEngine;
use polyedge::engine::session::{SessionConfig, TradeSession};
use polyedge::forecast::Forecaster;
use polyedge::platforms::{MarketDataSource, RawMarket};
use polyedge::screen::TradeabilityScreener;
use polyedge::storage::ResultStore;
use polyedge::strategy::sizing::{FixedFractionSizer, SizingConfig};
use polyedge::types::{Event, Market, Signal};

// ---------------------------------------------------------------------------
// Mocks
// ---------------------------------------------------------------------------

/// Deterministic in-memory market source.
///
/// Events, raw markets, and a forced error are fully controllable from
/// test code; call counts are tracked for retry assertions.
struct MockSource {
    events: Vec<Event>,
    markets: Vec<RawMarket>,
    force_error: Mutex<Option<String>>,
    event_calls: AtomicU32,
}

impl MockSource {
    fn new(events: Vec<Event>, markets: Vec<RawMarket>) -> Self {
        Self {
            events,
            markets,
            force_error: Mutex::new(None),
            event_calls: AtomicU32::new(0),
        }
    }

    fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }
}

#[async_trait]
impl MarketDataSource for MockSource {
    async fn fetch_tradeable_events(&self) -> Result<Vec<Event>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow::anyhow!("{msg}"));
        }
        Ok(self.events.clone())
    }

    async fn fetch_active_markets(&self, _limit: u32) -> Result<Vec<RawMarket>> {
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow::anyhow!("{msg}"));
        }
        Ok(self.markets.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Canned forecaster: maps market question to a fixed reply.
struct MockForecaster {
    replies: HashMap<String, String>,
}

impl MockForecaster {
    fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(q, r)| (q.to_string(), r.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Forecaster for MockForecaster {
    async fn estimate_probability(
        &self,
        _event_title: &str,
        market_question: &str,
        _outcome: &str,
    ) -> Result<String> {
        self.replies
            .get(market_question)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("forecast unavailable for {market_question}"))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

struct CountingCache {
    resets: AtomicU32,
}

impl CountingCache {
    fn new() -> Self {
        Self {
            resets: AtomicU32::new(0),
        }
    }
}

impl SessionCache for CountingCache {
    fn reset(&self) -> Result<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn market(id: &str, yes_price: f64) -> Market {
    Market {
        id: id.to_string(),
        question: format!("Will {id} resolve YES?"),
        outcomes: vec!["Yes".to_string(), "No".to_string()],
        outcome_prices: vec![yes_price, 100.0 - yes_price],
        spread: 2.0,
        active: true,
        accepting_orders: true,
    }
}

fn event(id: &str, markets: Vec<Market>) -> Event {
    Event {
        id: id.to_string(),
        title: format!("Event {id}"),
        markets,
        tradeable: true,
    }
}

fn raw_market(id: &str, question: &str, yes_fraction: f64) -> RawMarket {
    RawMarket {
        id: id.to_string(),
        question: question.to_string(),
        outcome_prices: Some(format!(
            "[\"{yes_fraction}\",\"{}\"]",
            1.0 - yes_fraction
        )),
        event_title: Some("Mock event".to_string()),
    }
}

fn trade_session(
    source: Arc<MockSource>,
    cache: Arc<CountingCache>,
    dir: &std::path::Path,
) -> TradeSession {
    TradeSession::new(
        MarketFunnel::new(source, Arc::new(TradeabilityScreener::default())),
        Arc::new(FixedFractionSizer::new(SizingConfig::default())),
        cache,
        ResultStore::new(dir),
        SessionConfig {
            max_attempts: 3,
            base_backoff_ms: 1,
        },
    )
}

// ---------------------------------------------------------------------------
// Trade session end-to-end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_trade_session_full_run() {
    let tmp = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new(
        vec![
            event("e1", vec![market("m1", 40.0), market("m2", 60.0)]),
            event("e2", vec![market("m3", 25.0)]),
        ],
        vec![],
    ));
    let cache = Arc::new(CountingCache::new());

    let record = trade_session(source.clone(), cache.clone(), tmp.path())
        .run()
        .await
        .unwrap();

    assert!(record.is_success());
    // First surviving market in preserved order wins.
    assert_eq!(record.market.as_ref().unwrap().id, "m1");
    // Default sizing: 5% of a $100 bankroll.
    assert_eq!(record.amount, Some(5.0));

    // Full audit trail: four funnel stages plus the trade step.
    let actions: Vec<&str> = record.steps.iter().map(|s| s.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "found_events",
            "filtered_events",
            "found_markets",
            "filtered_markets",
            "calculated_trade"
        ]
    );

    // One attempt, one cache reset, one persisted success document.
    assert_eq!(source.event_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.resets.load(Ordering::SeqCst), 1);
    let saved: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.starts_with("one_best_trade_2") // timestamp, not _error
        })
        .collect();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn test_trade_session_retries_until_exhausted() {
    let tmp = tempfile::tempdir().unwrap();
    let source = Arc::new(MockSource::new(vec![], vec![]));
    source.set_error("gamma unreachable");
    let cache = Arc::new(CountingCache::new());

    let err = trade_session(source.clone(), cache.clone(), tmp.path())
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("after 3 attempts"));
    assert!(err.to_string().contains("gamma unreachable"));
    assert_eq!(source.event_calls.load(Ordering::SeqCst), 3);
    assert_eq!(cache.resets.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_trade_session_empty_funnel_is_failure() {
    let tmp = tempfile::tempdir().unwrap();
    // Markets exist but none survive the price band.
    let source = Arc::new(MockSource::new(
        vec![event("e1", vec![market("m1", 99.5)])],
        vec![],
    ));
    let cache = Arc::new(CountingCache::new());

    let err = trade_session(source, cache, tmp.path())
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no actionable markets"));
}

// ---------------------------------------------------------------------------
// Recommendation batch end-to-end
// ---------------------------------------------------------------------------

fn recommend_engine(
    markets: Vec<RawMarket>,
    replies: &[(&str, &str)],
) -> RecommendEngine {
    RecommendEngine::new(
        Arc::new(MockSource::new(vec![], markets)),
        Arc::new(MockForecaster::new(replies)),
    )
    .with_forecast_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_recommend_ranks_by_absolute_edge() {
    let engine = recommend_engine(
        vec![
            raw_market("a", "QA?", 0.20),
            raw_market("b", "QB?", 0.50),
            raw_market("c", "QC?", 0.80),
        ],
        &[
            ("QA?", "Step by step... likelihood: 0.60"), // edge +40 → BUY_YES
            ("QB?", "likelihood: 0.50"),                 // edge 0 → HOLD
            ("QC?", "likelihood: 0.40"),                 // edge -40 → BUY_NO
        ],
    );

    let batch = engine.recommend(3, 15.0).await.unwrap();

    assert_eq!(batch.total_markets_analyzed, 3);
    assert_eq!(batch.min_edge_threshold, 15.0);
    let view: Vec<(&str, Signal)> = batch
        .recommendations
        .iter()
        .map(|r| (r.market_id.as_str(), r.signal))
        .collect();
    // |40| ties broken by fetch order, |0| last.
    assert_eq!(
        view,
        vec![
            ("a", Signal::BuyYes),
            ("c", Signal::BuyNo),
            ("b", Signal::Hold)
        ]
    );
    assert_eq!(batch.recommendations[0].edge, 40.0);
    assert_eq!(batch.recommendations[0].market_yes_price, 20.0);
    assert_eq!(batch.recommendations[0].ai_prediction, 60.0);
}

#[tokio::test]
async fn test_recommend_one_failure_does_not_sink_batch() {
    let engine = recommend_engine(
        vec![
            raw_market("a", "QA?", 0.30),
            raw_market("b", "QB?", 0.50), // no canned reply: forecast errors
            raw_market("c", "QC?", 0.70),
        ],
        &[("QA?", "likelihood: 0.70"), ("QC?", "likelihood: 0.30")],
    );

    let batch = engine.recommend(3, 15.0).await.unwrap();
    assert_eq!(batch.total_markets_analyzed, 3);
    assert_eq!(batch.recommendations.len(), 2);
    assert!(batch
        .recommendations
        .iter()
        .all(|r| r.market_id != "b"));
}

#[tokio::test]
async fn test_recommend_validity_gate_drops_junk() {
    let mut no_prices = raw_market("bad", "QBad?", 0.5);
    no_prices.outcome_prices = None;

    let engine = recommend_engine(
        vec![no_prices, raw_market("a", "QA?", 0.40)],
        &[("QA?", "likelihood: 0.40")],
    );

    let batch = engine.recommend(2, 15.0).await.unwrap();
    assert_eq!(batch.total_markets_analyzed, 1);
    assert_eq!(batch.recommendations[0].market_id, "a");
}

#[tokio::test]
async fn test_recommend_top_buys_filters_holds() {
    let engine = recommend_engine(
        vec![
            raw_market("a", "QA?", 0.20),
            raw_market("b", "QB?", 0.50),
        ],
        &[("QA?", "likelihood: 0.60"), ("QB?", "likelihood: 0.52")],
    );

    let batch = engine.recommend(2, 15.0).await.unwrap();
    let buys = batch.top_buys();
    assert_eq!(buys.len(), 1);
    assert_eq!(buys[0].market_id, "a");
}

#[tokio::test]
async fn test_recommend_source_failure_is_fatal() {
    let source = Arc::new(MockSource::new(vec![], vec![]));
    source.set_error("gamma unreachable");
    let engine = RecommendEngine::new(source, Arc::new(MockForecaster::new(&[])));

    let err = engine.recommend(3, 15.0).await.unwrap_err();
    assert!(err.to_string().contains("gamma unreachable"));
}

#[tokio::test]
async fn test_recommend_forecast_timeout_skips_market() {
    /// Forecaster that never answers.
    struct StallingForecaster;

    #[async_trait]
    impl Forecaster for StallingForecaster {
        async fn estimate_probability(&self, _: &str, _: &str, _: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }

        fn model_name(&self) -> &str {
            "stalling"
        }
    }

    let engine = RecommendEngine::new(
        Arc::new(MockSource::new(vec![], vec![raw_market("a", "QA?", 0.5)])),
        Arc::new(StallingForecaster),
    )
    .with_forecast_timeout(Duration::from_millis(50));

    let batch = engine.recommend(1, 15.0).await.unwrap();
    assert_eq!(batch.total_markets_analyzed, 1);
    assert!(batch.recommendations.is_empty());
}
