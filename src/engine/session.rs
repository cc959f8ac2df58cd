//! Trade session controller.
//!
//! Drives one complete decision cycle: reset the session cache, run the
//! funnel, size the trade, persist the outcome. Failed attempts are
//! retried with exponential backoff up to a bounded number of attempts;
//! every attempt leaves a persisted record, success or not.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cache::SessionCache;
use crate::engine::funnel::MarketFunnel;
use crate::storage::ResultStore;
use crate::strategy::sizing::TradeSizer;
use crate::types::TradeRecord;

/// The trade step recorded after the funnel's four filter stages.
const TRADE_STEP: u32 = 5;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Total attempts before giving up, including the first.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts (ms).
    pub base_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 1000,
        }
    }
}

pub struct TradeSession {
    funnel: MarketFunnel,
    sizer: Arc<dyn TradeSizer>,
    cache: Arc<dyn SessionCache>,
    store: ResultStore,
    config: SessionConfig,
}

impl TradeSession {
    pub fn new(
        funnel: MarketFunnel,
        sizer: Arc<dyn TradeSizer>,
        cache: Arc<dyn SessionCache>,
        store: ResultStore,
        config: SessionConfig,
    ) -> Self {
        Self {
            funnel,
            sizer,
            cache,
            store,
            config,
        }
    }

    /// Run the session until one attempt succeeds or attempts run out.
    ///
    /// Each attempt starts from a cleared cache and a fresh audit trail.
    /// Every error inside an attempt — cache reset, funnel, sizing, even
    /// persistence — is caught here, written into the attempt's record,
    /// and retried up to the attempt limit. The returned record is the
    /// successful one.
    pub async fn run(&self) -> Result<TradeRecord> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.config.base_backoff_ms * 2u64.pow(attempt - 2);
                info!(attempt, delay_ms = delay, "Retrying trade session");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let mut record = TradeRecord::new();

            match self.attempt(&mut record, attempt).await {
                Ok(()) => {
                    info!(attempt, trade = ?record.best_trade, "Trade session succeeded");
                    return Ok(record);
                }
                Err(e) => {
                    last_error = format!("{e:#}");
                    record.error = Some(last_error.clone());
                    // A failure to persist the error record must not
                    // abort the session; the retry loop owns recovery.
                    if let Err(save_err) = self.store.save(
                        "one_best_trade_error",
                        &record,
                        json!({ "attempt": attempt }),
                    ) {
                        warn!(attempt, error = %save_err, "Failed to persist error record");
                    }
                    warn!(attempt, max_attempts, error = %last_error, "Trade session attempt failed");
                }
            }
        }

        error!(max_attempts, "Trade session exhausted all attempts");
        anyhow::bail!("Trade session failed after {max_attempts} attempts: {last_error}")
    }

    async fn attempt(&self, record: &mut TradeRecord, attempt: u32) -> Result<()> {
        self.cache.reset()?;
        let market = self.funnel.run(record).await?;
        let amount = self.sizer.size_trade(&market).await?;
        record.record_trade(TRADE_STEP, market, amount);
        self.store
            .save("one_best_trade", record, json!({ "attempt": attempt }))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
