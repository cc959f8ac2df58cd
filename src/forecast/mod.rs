//! Probability forecasting.
//!
//! A `Forecaster` turns a market question into a free-text probability
//! estimate; `parse` extracts the number from it. The two are separate
//! on purpose: extraction is pure and testable, the forecaster is an
//! I/O boundary.

pub mod openai;
pub mod parse;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over probability forecasting backends.
#[async_trait]
pub trait Forecaster: Send + Sync {
    /// Produce a free-text probability estimate for one market outcome.
    /// The text should carry the estimate in a form `parse::extract_probability`
    /// can recover.
    async fn estimate_probability(
        &self,
        event_title: &str,
        market_question: &str,
        outcome: &str,
    ) -> Result<String>;

    /// Model identifier for logging and error reporting.
    fn model_name(&self) -> &str;
}
