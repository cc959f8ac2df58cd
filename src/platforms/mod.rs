//! Market data integrations.
//!
//! Defines the `MarketDataSource` trait the decision funnel and batch
//! engine consume, plus the Polymarket Gamma implementation. Prices
//! cross this boundary as 0–100 percentages; the wire format's 0–1
//! fractions never leak past it.

pub mod polymarket;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Event;

/// A market record as returned by the data source, before validation.
///
/// `outcome_prices` stays in its JSON-encoded wire form
/// (`"[\"0.65\",\"0.35\"]"`) so the batch engine owns the parse-or-default
/// policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarket {
    pub id: String,
    pub question: String,
    pub outcome_prices: Option<String>,
    pub event_title: Option<String>,
}

impl RawMarket {
    /// JSON-decoded outcome price strings, or None if the field is
    /// missing or not a JSON array.
    pub fn outcome_price_list(&self) -> Option<Vec<String>> {
        let raw = self.outcome_prices.as_deref()?;
        serde_json::from_str(raw).ok()
    }

    /// Whether this record is complete enough to score: a non-empty
    /// question and a parseable outcome-price list.
    pub fn is_scoreable(&self) -> bool {
        !self.question.trim().is_empty() && self.outcome_price_list().is_some()
    }

    /// Market YES price as a 0–100 percentage: first outcome price × 100.
    /// Falls back to 0.0 when the first price is missing or unparseable —
    /// a defined default, not an error.
    pub fn yes_price_pct(&self) -> f64 {
        self.outcome_price_list()
            .and_then(|prices| prices.first().and_then(|p| p.trim().parse::<f64>().ok()))
            .map(|p| p * 100.0)
            .unwrap_or(0.0)
    }
}

/// Abstraction over prediction-market data providers.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch all currently tradeable events (with their child markets).
    async fn fetch_tradeable_events(&self) -> Result<Vec<Event>>;

    /// Fetch up to `limit` active, non-closed market records.
    async fn fetch_active_markets(&self, limit: u32) -> Result<Vec<RawMarket>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
