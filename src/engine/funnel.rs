//! Market filter funnel.
//!
//! Four stages, each strictly narrowing: fetch tradeable events, filter
//! events, expand into markets, filter markets. The first market to
//! survive stage 4 is the pick. Every stage appends a record to the
//! session audit trail before the next stage runs, so a failed run
//! still shows how far it got.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::platforms::MarketDataSource;
use crate::screen::MarketScreener;
use crate::types::{Market, PipelineError, TradeRecord};

pub struct MarketFunnel {
    source: Arc<dyn MarketDataSource>,
    screener: Arc<dyn MarketScreener>,
}

impl MarketFunnel {
    pub fn new(source: Arc<dyn MarketDataSource>, screener: Arc<dyn MarketScreener>) -> Self {
        Self { source, screener }
    }

    /// Run the funnel to completion and return the selected market.
    ///
    /// All four stages run and record their counts even over an empty
    /// universe; only the final selection can fail, and there is no
    /// fallback pick.
    pub async fn run(&self, record: &mut TradeRecord) -> Result<Market> {
        // Stage 1: fetch the tradeable event universe.
        let events = self.source.fetch_tradeable_events().await?;
        let found_events = events.len();
        record.record_stage(1, "found_events", None, found_events);
        info!(source = self.source.name(), count = found_events, "Stage 1: found events");

        // Stage 2: drop events not worth pursuing.
        let events = self.screener.filter_events(events).await?;
        let kept_events = events.len();
        record.record_stage(2, "filtered_events", Some(found_events), kept_events);
        info!(count = kept_events, "Stage 2: filtered events");

        // Stage 3: flatten surviving events into markets.
        let markets = self.screener.expand_markets(events).await?;
        let found_markets = markets.len();
        record.record_stage(3, "found_markets", Some(kept_events), found_markets);
        info!(count = found_markets, "Stage 3: expanded markets");

        // Stage 4: keep only genuinely tradeable markets. The first
        // survivor, in preserved order, is the pick.
        let markets = self.screener.filter_markets(markets).await?;
        let kept_markets = markets.len();
        record.record_stage(4, "filtered_markets", Some(found_markets), kept_markets);
        info!(count = kept_markets, "Stage 4: filtered markets");

        let best = markets
            .into_iter()
            .next()
            .ok_or(PipelineError::NoActionableMarkets)?;

        info!(market = %best, "Funnel selected market");
        Ok(best)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
