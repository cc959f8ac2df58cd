//! Polymarket integration.
//!
//! Uses the Gamma API for event and market discovery (no auth required).
//! Order placement is out of scope for this crate; the funnel stops at a
//! trade recommendation.
//!
//! Gamma API: https://gamma-api.polymarket.com

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::platforms::{MarketDataSource, RawMarket};
use crate::types::{Event, Market, PipelineError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
const DEFAULT_EVENT_LIMIT: u32 = 100;
const HTTP_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Gamma API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct GammaEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub markets: Vec<GammaMarket>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GammaMarket {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default, rename = "conditionId")]
    pub condition_id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default, rename = "acceptingOrders")]
    pub accepting_orders: bool,
    /// Outcome labels as a JSON string: "[\"Yes\",\"No\"]"
    #[serde(default)]
    pub outcomes: Option<String>,
    /// Outcome prices as a JSON string: "[\"0.65\",\"0.35\"]"
    #[serde(default, rename = "outcomePrices")]
    pub outcome_prices: Option<String>,
    /// Spread as a 0–1 fraction.
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default)]
    pub events: Option<Vec<GammaEventRef>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GammaEventRef {
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PolymarketClient {
    http: Client,
    base_url: String,
    event_limit: u32,
}

impl PolymarketClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GAMMA_API_URL)
    }

    /// Construct against a non-default Gamma endpoint (tests, proxies).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build Polymarket HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            event_limit: DEFAULT_EVENT_LIMIT,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "Gamma API request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .context("Gamma API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::MarketData(format!("Gamma API error {status}: {body}")).into());
        }

        resp.json::<T>().await.context("Failed to parse Gamma response")
    }

    /// Convert a Gamma market into the internal Market type.
    /// Returns None for records missing an identifier or question.
    pub fn convert_market(gm: &GammaMarket) -> Option<Market> {
        let id = if gm.condition_id.is_empty() {
            gm.id.clone()
        } else {
            gm.condition_id.clone()
        };
        if id.is_empty() || gm.question.is_empty() {
            return None;
        }

        let outcomes = gm
            .outcomes
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_else(|| vec!["Yes".to_string(), "No".to_string()]);

        let outcome_prices = gm
            .outcome_prices
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .map(|prices| {
                prices
                    .iter()
                    .filter_map(|p| p.trim().parse::<f64>().ok())
                    .map(|p| p * 100.0)
                    .collect()
            })
            .unwrap_or_default();

        Some(Market {
            id,
            question: gm.question.clone(),
            outcomes,
            outcome_prices,
            spread: gm.spread.unwrap_or(0.0) * 100.0,
            active: gm.active && !gm.closed,
            accepting_orders: gm.accepting_orders,
        })
    }

    fn convert_event(ge: &GammaEvent) -> Option<Event> {
        if ge.id.is_empty() {
            return None;
        }
        let markets = ge.markets.iter().filter_map(Self::convert_market).collect();
        Some(Event {
            id: ge.id.clone(),
            title: ge.title.clone(),
            markets,
            tradeable: ge.active && !ge.closed,
        })
    }

    fn convert_raw(gm: &GammaMarket) -> RawMarket {
        RawMarket {
            id: if gm.condition_id.is_empty() {
                gm.id.clone()
            } else {
                gm.condition_id.clone()
            },
            question: gm.question.clone(),
            outcome_prices: gm.outcome_prices.clone(),
            event_title: gm
                .events
                .as_ref()
                .and_then(|evs| evs.first())
                .map(|e| e.title.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// MarketDataSource trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketDataSource for PolymarketClient {
    async fn fetch_tradeable_events(&self) -> Result<Vec<Event>> {
        let gamma_events: Vec<GammaEvent> = self
            .get_json(
                "/events",
                &[
                    ("active", "true".to_string()),
                    ("closed", "false".to_string()),
                    ("limit", self.event_limit.to_string()),
                ],
            )
            .await?;

        let events: Vec<Event> = gamma_events
            .iter()
            .filter_map(Self::convert_event)
            .filter(|e| e.tradeable)
            .collect();

        info!(count = events.len(), "Fetched tradeable Polymarket events");
        Ok(events)
    }

    async fn fetch_active_markets(&self, limit: u32) -> Result<Vec<RawMarket>> {
        let gamma_markets: Vec<GammaMarket> = self
            .get_json(
                "/markets",
                &[
                    ("active", "true".to_string()),
                    ("closed", "false".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let raw: Vec<RawMarket> = gamma_markets.iter().map(Self::convert_raw).collect();
        info!(count = raw.len(), "Fetched active Polymarket markets");
        Ok(raw)
    }

    fn name(&self) -> &str {
        "polymarket"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gamma_market(question: &str, prices: Option<&str>) -> GammaMarket {
        GammaMarket {
            id: "123".to_string(),
            question: question.to_string(),
            condition_id: "0xabc".to_string(),
            active: true,
            closed: false,
            accepting_orders: true,
            outcomes: Some("[\"Yes\",\"No\"]".to_string()),
            outcome_prices: prices.map(String::from),
            spread: Some(0.02),
            events: Some(vec![GammaEventRef {
                title: "Parent event".to_string(),
            }]),
        }
    }

    #[test]
    fn test_convert_market_valid() {
        let gm = gamma_market("Will X happen?", Some("[\"0.72\",\"0.28\"]"));
        let market = PolymarketClient::convert_market(&gm).unwrap();
        assert_eq!(market.id, "0xabc");
        assert_eq!(market.outcomes, vec!["Yes", "No"]);
        assert!((market.outcome_prices[0] - 72.0).abs() < 1e-10);
        assert!((market.outcome_prices[1] - 28.0).abs() < 1e-10);
        assert!((market.spread - 2.0).abs() < 1e-10);
        assert!(market.is_tradeable());
    }

    #[test]
    fn test_convert_market_missing_question() {
        let gm = gamma_market("", Some("[\"0.5\",\"0.5\"]"));
        assert!(PolymarketClient::convert_market(&gm).is_none());
    }

    #[test]
    fn test_convert_market_falls_back_to_numeric_id() {
        let mut gm = gamma_market("Q?", Some("[\"0.5\",\"0.5\"]"));
        gm.condition_id = String::new();
        let market = PolymarketClient::convert_market(&gm).unwrap();
        assert_eq!(market.id, "123");
    }

    #[test]
    fn test_convert_market_unparseable_prices_empty() {
        let gm = gamma_market("Q?", Some("garbage"));
        let market = PolymarketClient::convert_market(&gm).unwrap();
        assert!(market.outcome_prices.is_empty());
    }

    #[test]
    fn test_convert_market_closed_not_active() {
        let mut gm = gamma_market("Q?", Some("[\"0.5\",\"0.5\"]"));
        gm.closed = true;
        let market = PolymarketClient::convert_market(&gm).unwrap();
        assert!(!market.active);
    }

    #[test]
    fn test_convert_event_keeps_child_markets() {
        let ge = GammaEvent {
            id: "ev1".to_string(),
            title: "Election night".to_string(),
            active: true,
            closed: false,
            markets: vec![
                gamma_market("Q1?", Some("[\"0.4\",\"0.6\"]")),
                gamma_market("", None), // dropped
            ],
        };
        let event = PolymarketClient::convert_event(&ge).unwrap();
        assert_eq!(event.markets.len(), 1);
        assert!(event.tradeable);
    }

    #[test]
    fn test_convert_raw_carries_event_title() {
        let gm = gamma_market("Q?", Some("[\"0.4\",\"0.6\"]"));
        let raw = PolymarketClient::convert_raw(&gm);
        assert_eq!(raw.id, "0xabc");
        assert_eq!(raw.event_title.as_deref(), Some("Parent event"));
        assert!(raw.is_scoreable());
    }

    #[test]
    fn test_client_construction() {
        let client = PolymarketClient::new().unwrap();
        assert_eq!(client.name(), "polymarket");
        assert_eq!(client.base_url, GAMMA_API_URL);
    }
}
