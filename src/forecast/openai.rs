//! OpenAI forecaster.
//!
//! Implements the `Forecaster` trait against the Chat Completions API.
//! Handles prompt construction, rate limiting with exponential backoff,
//! and response extraction. The superforecaster prompt asks the model
//! to end with a labelled likelihood line so extraction stays reliable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Forecaster;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Maximum retries on rate limit / server errors.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiForecaster {
    http: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiForecaster {
    pub fn new(api_key: String, model: Option<String>, max_tokens: Option<u32>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// Send a chat request with retry + backoff.
    async fn call_api(&self, system: &str, user_message: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.2,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying OpenAI API call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(OPENAI_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body: ChatResponse = response
                            .json()
                            .await
                            .context("Failed to parse OpenAI response")?;

                        let text = body
                            .choices
                            .first()
                            .map(|c| c.message.content.clone())
                            .unwrap_or_default();

                        if text.is_empty() {
                            anyhow::bail!("OpenAI response contained no choices");
                        }
                        return Ok(text);
                    }

                    // Retryable: 429 (rate limit) and 500+
                    if status.as_u16() == 429 || status.as_u16() >= 500 {
                        let error_text = response.text().await.unwrap_or_default();
                        warn!(status = %status, attempt, error = %error_text, "Retryable OpenAI API error");
                        last_error = Some(format!("HTTP {status}: {error_text}"));
                        continue;
                    }

                    // Non-retryable error
                    let error_text = response.text().await.unwrap_or_default();
                    anyhow::bail!("OpenAI API error {status}: {error_text}");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "OpenAI request failed");
                    last_error = Some(format!("Request error: {e}"));
                    continue;
                }
            }
        }

        anyhow::bail!(
            "OpenAI API failed after {} retries: {}",
            MAX_RETRIES,
            last_error.unwrap_or_default()
        )
    }

    /// System prompt for calibrated superforecasting.
    pub fn system_prompt() -> &'static str {
        "You are a superforecaster estimating probabilities for prediction \
         market outcomes. You have a strong track record of calibrated, \
         accurate forecasts.\n\n\
         RULES:\n\
         1. Break the question into its key drivers and base rates.\n\
         2. Weigh evidence for and against the outcome before deciding.\n\
         3. Note what the market has likely already priced in.\n\
         4. Be genuinely calibrated: when you say 70%, such events should \
            happen about 70% of the time.\n\
         5. Your final answer MUST be the very last line, in exactly this \
            format:\n\
            likelihood: 0.XX"
    }

    /// Build the user prompt for a single market outcome.
    pub fn build_prompt(event_title: &str, market_question: &str, outcome: &str) -> String {
        let mut prompt = String::with_capacity(512);
        if !event_title.is_empty() {
            prompt.push_str(&format!("EVENT: \"{event_title}\"\n"));
        }
        prompt.push_str(&format!("QUESTION: \"{market_question}\"\n"));
        prompt.push_str(&format!("OUTCOME: \"{outcome}\"\n\n"));
        prompt.push_str(
            "Estimate the probability that this question resolves to the \
             given outcome. Reason step-by-step, then give your final \
             likelihood on the last line.",
        );
        prompt
    }
}

// ---------------------------------------------------------------------------
// Forecaster implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Forecaster for OpenAiForecaster {
    async fn estimate_probability(
        &self,
        event_title: &str,
        market_question: &str,
        outcome: &str,
    ) -> Result<String> {
        let system = Self::system_prompt();
        let user_msg = Self::build_prompt(event_title, market_question, outcome);

        debug!(model = %self.model, question = %market_question, "Requesting probability estimate");

        let text = self
            .call_api(system, &user_msg)
            .await
            .context("OpenAI forecast call failed")?;

        info!(
            model = %self.model,
            chars = text.len(),
            "Forecast complete"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
