//! Shared types for the POLYEDGE agent.
//!
//! These types form the data model used across all modules. Prices and
//! probabilities are expressed as f64 percentages on a 0–100 scale
//! throughout; conversion from the wire format (0–1 fractions) happens
//! at the platform boundary and nowhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Event & Market
// ---------------------------------------------------------------------------

/// A topical grouping of one or more related markets. Immutable once
/// fetched within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub markets: Vec<Market>,
    pub tradeable: bool,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({} markets)", self.id, self.title, self.markets.len())
    }
}

/// A single tradeable question with a live price. Immutable snapshot
/// for the duration of one scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    /// Outcome labels, at minimum a "Yes"/"No" pair.
    pub outcomes: Vec<String>,
    /// Current outcome prices (0–100), parallel to `outcomes`.
    pub outcome_prices: Vec<f64>,
    /// Bid/ask spread in percentage points.
    pub spread: f64,
    pub active: bool,
    pub accepting_orders: bool,
}

impl Market {
    /// Current YES price (first outcome price), if present.
    pub fn yes_price(&self) -> Option<f64> {
        self.outcome_prices.first().copied()
    }

    /// Whether this market is currently tradeable at all.
    pub fn is_tradeable(&self) -> bool {
        self.active && self.accepting_orders
    }

    /// Helper to build a test market with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str, yes_price: f64) -> Self {
        Market {
            id: id.to_string(),
            question: format!("Test market {id}?"),
            outcomes: vec!["Yes".to_string(), "No".to_string()],
            outcome_prices: vec![yes_price, 100.0 - yes_price],
            spread: 2.0,
            active: true,
            accepting_orders: true,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (YES: {:.1}% | spread: {:.1})",
            self.id,
            self.question,
            self.yes_price().unwrap_or(0.0),
            self.spread,
        )
    }
}

// ---------------------------------------------------------------------------
// Signals & scores
// ---------------------------------------------------------------------------

/// Discrete trade recommendation derived from edge vs. threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    BuyYes,
    BuyNo,
    Hold,
}

impl Signal {
    /// Whether this signal is actionable (any BUY_* variant).
    pub fn is_buy(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::BuyYes => write!(f, "BUY_YES"),
            Signal::BuyNo => write!(f, "BUY_NO"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

/// Signed divergence between a model probability and a market price,
/// in percentage points, paired with the derived signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeScore {
    pub edge: f64,
    pub signal: Signal,
}

/// Free-text forecaster output plus the percentage extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityEstimate {
    pub raw_text: String,
    /// Extracted probability (0–100).
    pub probability: f64,
}

impl fmt::Display for ProbabilityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P={:.1}%", self.probability)
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// One scored market, the unit returned in batch mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub market_id: String,
    pub question: String,
    pub event_title: String,
    /// Market YES price (0–100).
    pub market_yes_price: f64,
    /// Model probability (0–100).
    pub ai_prediction: f64,
    /// ai_prediction − market_yes_price, in percentage points.
    pub edge: f64,
    pub signal: Signal,
    pub raw_prediction: String,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} | mkt={:.1}% ai={:.1}% edge={:+.2}",
            self.signal, self.question, self.market_yes_price, self.ai_prediction, self.edge,
        )
    }
}

/// Result of one batch scoring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationBatch {
    pub timestamp: DateTime<Utc>,
    pub total_markets_analyzed: usize,
    pub min_edge_threshold: f64,
    /// Sorted by descending absolute edge, stable for ties.
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationBatch {
    /// Display-only view: the first 5 BUY signals in batch order.
    pub fn top_buys(&self) -> Vec<&Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.signal.is_buy())
            .take(5)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Session audit trail
// ---------------------------------------------------------------------------

/// One funnel stage outcome, appended to the session's TradeRecord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub step: u32,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade: Option<String>,
}

/// Append-only audit trail for one trade session attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRecord {
    pub steps: Vec<StageRecord>,
    pub error: Option<String>,
    pub best_trade: Option<String>,
    pub market: Option<Market>,
    pub amount: Option<f64>,
}

impl TradeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage record with before/after counts.
    pub fn record_stage(
        &mut self,
        step: u32,
        action: &str,
        input_count: Option<usize>,
        output_count: usize,
    ) {
        self.steps.push(StageRecord {
            step,
            action: action.to_string(),
            input_count,
            output_count: Some(output_count),
            trade: None,
        });
    }

    /// Append the final trade step and fill in the selected market.
    pub fn record_trade(&mut self, step: u32, market: Market, amount: f64) {
        let trade = format!("{market} amount=${amount:.2}");
        self.steps.push(StageRecord {
            step,
            action: "calculated_trade".to_string(),
            input_count: None,
            output_count: None,
            trade: Some(trade.clone()),
        });
        self.best_trade = Some(trade);
        self.market = Some(market);
        self.amount = Some(amount);
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.market.is_some()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Domain-specific error types for the decision pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Forecast error ({model}): {message}")]
    Forecast { model: String, message: String },

    #[error("Funnel produced no actionable markets")]
    NoActionableMarkets,

    #[error("Trade sizing error: {0}")]
    Sizing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
