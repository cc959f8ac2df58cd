//! Recommendation batch engine.
//!
//! Scores a batch of markets against the forecaster and ranks them by
//! absolute edge. One bad market never sinks the batch: forecast and
//! parse failures are logged and skipped. Output order is deterministic
//! for a given input: concurrency is an implementation detail, results
//! are restored to fetch order before ranking, and the rank sort is
//! stable.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::forecast::{parse, Forecaster};
use crate::platforms::{MarketDataSource, RawMarket};
use crate::strategy::edge;
use crate::types::{PipelineError, ProbabilityEstimate, Recommendation, RecommendationBatch};

/// How many forecasts may be in flight at once.
const DEFAULT_CONCURRENCY: usize = 4;

/// Per-forecast deadline.
const DEFAULT_FORECAST_TIMEOUT_SECS: u64 = 60;

/// Overfetch factor: request more markets than asked for so the
/// validity gate still leaves enough to score.
const FETCH_MULTIPLIER: u32 = 2;

pub struct RecommendEngine {
    source: Arc<dyn MarketDataSource>,
    forecaster: Arc<dyn Forecaster>,
    concurrency: usize,
    forecast_timeout: Duration,
}

impl RecommendEngine {
    pub fn new(source: Arc<dyn MarketDataSource>, forecaster: Arc<dyn Forecaster>) -> Self {
        Self {
            source,
            forecaster,
            concurrency: DEFAULT_CONCURRENCY,
            forecast_timeout: Duration::from_secs(DEFAULT_FORECAST_TIMEOUT_SECS),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_forecast_timeout(mut self, timeout: Duration) -> Self {
        self.forecast_timeout = timeout;
        self
    }

    /// Score up to `limit` markets and rank them by absolute edge.
    pub async fn recommend(&self, limit: u32, min_edge: f64) -> Result<RecommendationBatch> {
        if limit == 0 {
            return Err(PipelineError::Config("limit must be at least 1".to_string()).into());
        }
        if min_edge < 0.0 {
            return Err(
                PipelineError::Config("min_edge must be non-negative".to_string()).into(),
            );
        }

        let raw = self
            .source
            .fetch_active_markets(limit.saturating_mul(FETCH_MULTIPLIER))
            .await?;
        let fetched = raw.len();

        // Validity gate: no question or no parseable prices means the
        // market cannot be scored at all.
        let candidates: Vec<RawMarket> = raw
            .into_iter()
            .filter(|m| m.is_scoreable())
            .take(limit as usize)
            .collect();

        info!(
            fetched,
            scoreable = candidates.len(),
            limit,
            "Scoring market batch"
        );

        // Forecast concurrently, carrying the original index so fetch
        // order can be restored after out-of-order completion.
        let mut scored: Vec<(usize, Recommendation)> = stream::iter(
            candidates.iter().enumerate(),
        )
        .map(|(idx, market)| async move {
            match self.score_market(market, min_edge).await {
                Ok(rec) => Some((idx, rec)),
                Err(e) => {
                    warn!(market_id = %market.id, error = %e, "Skipping market");
                    None
                }
            }
        })
        .buffer_unordered(self.concurrency)
        .filter_map(|r| async move { r })
        .collect()
        .await;

        scored.sort_by_key(|(idx, _)| *idx);
        let mut recommendations: Vec<Recommendation> =
            scored.into_iter().map(|(_, rec)| rec).collect();

        // Stable sort keeps fetch order among equal absolute edges.
        recommendations.sort_by(|a, b| {
            b.edge
                .abs()
                .partial_cmp(&a.edge.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let total_markets_analyzed = candidates.len();
        let buys = recommendations.iter().filter(|r| r.signal.is_buy()).count();
        info!(
            analyzed = total_markets_analyzed,
            scored = recommendations.len(),
            buys,
            "Batch scoring complete"
        );

        Ok(RecommendationBatch {
            timestamp: chrono::Utc::now(),
            total_markets_analyzed,
            min_edge_threshold: min_edge,
            recommendations,
        })
    }

    /// Forecast one market, extract the probability, and score the edge.
    async fn score_market(&self, market: &RawMarket, min_edge: f64) -> Result<Recommendation> {
        let event_title = market.event_title.clone().unwrap_or_default();

        let raw_prediction = tokio::time::timeout(
            self.forecast_timeout,
            self.forecaster
                .estimate_probability(&event_title, &market.question, "Yes"),
        )
        .await
        .map_err(|_| PipelineError::Forecast {
            model: self.forecaster.model_name().to_string(),
            message: format!("timed out after {:?}", self.forecast_timeout),
        })??;

        let estimate = ProbabilityEstimate {
            probability: parse::extract_probability(&raw_prediction),
            raw_text: raw_prediction,
        };

        let market_yes_price = market.yes_price_pct();
        if market_yes_price == 0.0 {
            warn!(market_id = %market.id, "YES price defaulted to 0.0");
        }

        let score = edge::score(market_yes_price, estimate.probability, min_edge);

        Ok(Recommendation {
            market_id: market.id.clone(),
            question: market.question.clone(),
            event_title,
            market_yes_price,
            ai_prediction: estimate.probability,
            edge: score.edge,
            signal: score.signal,
            raw_prediction: estimate.raw_text,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
