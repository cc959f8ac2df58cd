//! Trade sizing.
//!
//! The funnel delegates sizing to a collaborator behind the `TradeSizer`
//! trait; the default implementation stakes a fixed fraction of bankroll.
//! Kelly-style sizing can slot in behind the same trait later.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::types::{Market, PipelineError};

/// Abstraction over trade sizing policies.
#[async_trait]
pub trait TradeSizer: Send + Sync {
    /// Compute the dollar amount to commit to the selected market.
    async fn size_trade(&self, market: &Market) -> Result<f64>;
}

/// Fixed-fraction sizing configuration.
#[derive(Debug, Clone)]
pub struct SizingConfig {
    /// Total bankroll in dollars.
    pub bankroll: f64,
    /// Fraction of bankroll to stake per trade.
    pub stake_fraction: f64,
    /// Minimum viable stake; anything below is a sizing error.
    pub min_stake: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            bankroll: 100.0,
            stake_fraction: 0.05,
            min_stake: 1.0,
        }
    }
}

/// Stakes `bankroll * stake_fraction` on every trade.
pub struct FixedFractionSizer {
    config: SizingConfig,
}

impl FixedFractionSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TradeSizer for FixedFractionSizer {
    async fn size_trade(&self, market: &Market) -> Result<f64> {
        let amount = self.config.bankroll * self.config.stake_fraction;
        if amount < self.config.min_stake {
            return Err(PipelineError::Sizing(format!(
                "stake ${amount:.2} below minimum ${:.2}",
                self.config.min_stake
            ))
            .into());
        }
        debug!(
            market_id = %market.id,
            amount = format!("${amount:.2}"),
            "Trade sized"
        );
        Ok(amount)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
