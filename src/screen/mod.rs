//! Market screening.
//!
//! The decision funnel narrows a raw event universe down to a single
//! tradeable market through the `MarketScreener` collaborator. Each
//! method is one funnel stage; the funnel itself only orchestrates and
//! records counts.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::types::{Event, Market};

/// Abstraction over the filtering stages of the decision funnel.
#[async_trait]
pub trait MarketScreener: Send + Sync {
    /// Stage 2: drop events not worth pursuing. Order must be preserved.
    async fn filter_events(&self, events: Vec<Event>) -> Result<Vec<Event>>;

    /// Stage 3: flatten surviving events into their child markets,
    /// preserving event order and within-event market order.
    async fn expand_markets(&self, events: Vec<Event>) -> Result<Vec<Market>>;

    /// Stage 4: drop markets that cannot actually be traded.
    /// Order must be preserved; the first survivor is the pick.
    async fn filter_markets(&self, markets: Vec<Market>) -> Result<Vec<Market>>;
}

/// Screening thresholds.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// YES price must sit strictly inside [min_price, max_price] to
    /// leave room for the position to move.
    pub min_price: f64,
    pub max_price: f64,
    /// Maximum tolerated bid/ask spread in percentage points.
    pub max_spread: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            min_price: 2.0,
            max_price: 98.0,
            max_spread: 10.0,
        }
    }
}

/// Rule-based screener: keeps events that are open with at least one
/// market, and markets that are live, priced inside the band, and not
/// too wide.
pub struct TradeabilityScreener {
    config: ScreenConfig,
}

impl TradeabilityScreener {
    pub fn new(config: ScreenConfig) -> Self {
        Self { config }
    }

    fn market_passes(&self, market: &Market) -> bool {
        if !market.is_tradeable() {
            debug!(market_id = %market.id, "Screened out: not accepting orders");
            return false;
        }
        let Some(price) = market.yes_price() else {
            debug!(market_id = %market.id, "Screened out: no price");
            return false;
        };
        if price < self.config.min_price || price > self.config.max_price {
            debug!(market_id = %market.id, price, "Screened out: price outside band");
            return false;
        }
        if market.spread > self.config.max_spread {
            debug!(market_id = %market.id, spread = market.spread, "Screened out: spread too wide");
            return false;
        }
        true
    }
}

impl Default for TradeabilityScreener {
    fn default() -> Self {
        Self::new(ScreenConfig::default())
    }
}

#[async_trait]
impl MarketScreener for TradeabilityScreener {
    async fn filter_events(&self, events: Vec<Event>) -> Result<Vec<Event>> {
        Ok(events
            .into_iter()
            .filter(|e| e.tradeable && !e.markets.is_empty())
            .collect())
    }

    async fn expand_markets(&self, events: Vec<Event>) -> Result<Vec<Market>> {
        Ok(events.into_iter().flat_map(|e| e.markets).collect())
    }

    async fn filter_markets(&self, markets: Vec<Market>) -> Result<Vec<Market>> {
        Ok(markets
            .into_iter()
            .filter(|m| self.market_passes(m))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
