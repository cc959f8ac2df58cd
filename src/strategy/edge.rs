//! Edge scoring.
//!
//! Compares a model probability against a market-implied price and maps
//! the divergence to a discrete trade signal. Pure functions, no I/O.

use crate::types::{EdgeScore, Signal};

/// Default signal threshold in percentage points.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 15.0;

/// Score a market against a model estimate.
///
/// Both inputs are percentages on the 0–100 scale. The edge is
/// `estimate_probability - market_price`, rounded to 2 decimal places:
/// positive means the model is more bullish on YES than the market.
pub fn score(market_price: f64, estimate_probability: f64, threshold: f64) -> EdgeScore {
    let edge = round2(estimate_probability - market_price);
    let signal = if edge > threshold {
        Signal::BuyYes
    } else if edge < -threshold {
        Signal::BuyNo
    } else {
        Signal::Hold
    };
    EdgeScore { edge, signal }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
