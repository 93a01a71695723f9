//! Live exchange-rate lookup.
//!
//! A thin client for a generative-language endpoint with search grounding:
//! one prompt asking for mid-market rates against the rupiah, a JSON response
//! schema, and the grounding sources passed through for display. Quotes are
//! reference material only; nothing here ever writes into a document.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::info;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Currencies quoted by default.
pub const DEFAULT_CURRENCIES: [&str; 8] =
    ["USD", "EUR", "SGD", "AUD", "JPY", "GBP", "CNY", "MYR"];

/// One quoted exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Currency code.
    pub currency: String,
    /// Mid-market rate in rupiah.
    pub rate: f64,
}

/// Provenance of a quote, as reported by search grounding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateSource {
    /// Page title, when known.
    pub title: Option<String>,
    /// Page URL, when known.
    pub uri: Option<String>,
}

/// A fetched batch of quotes with provenance and a timestamp.
#[derive(Debug, Clone)]
pub struct RateSheet {
    /// The quotes, in response order.
    pub quotes: Vec<RateQuote>,
    /// Grounding sources backing the quotes.
    pub sources: Vec<RateSource>,
    /// When the batch arrived.
    pub fetched_at: DateTime<Utc>,
}

/// Rates client settings, a section of the application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesConfig {
    /// API key; falls back to [`API_KEY_ENV`] when absent.
    pub api_key: Option<String>,
    /// Model identifier appended to the endpoint.
    pub model: String,
    /// Currencies to quote.
    pub currencies: Vec<String>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-3-flash-preview".to_string(),
            currencies: DEFAULT_CURRENCIES
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }
}

/// Events emitted by the async rate fetcher.
#[derive(Debug)]
pub enum RateEvent {
    /// Fetch succeeded.
    Loaded(RateSheet),
    /// Fetch failed.
    Failed(anyhow::Error),
}

/// Shared cache of the most recently fetched sheet.
#[derive(Clone, Default)]
pub struct RateBook {
    inner: Arc<RwLock<Option<RateSheet>>>,
}

impl RateBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest sheet, if any fetch has succeeded.
    pub fn latest(&self) -> Option<RateSheet> {
        self.inner.read().clone()
    }

    /// Replace the cached sheet.
    pub fn store(&self, sheet: RateSheet) {
        *self.inner.write() = Some(sheet);
    }
}

/// Client for the rates endpoint.
pub struct RateClient {
    http: reqwest::Client,
    config: RatesConfig,
}

impl RateClient {
    /// Build a client from configuration.
    pub fn new(config: RatesConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Fetch one sheet of quotes.
    pub async fn fetch(&self) -> Result<RateSheet> {
        let Some(key) = self.api_key() else {
            bail!("no rates API key configured; set rates.api_key or {API_KEY_ENV}");
        };

        let prompt = format!(
            "Get the current middle-market exchange rates for the following \
             currencies to Indonesian Rupiah (IDR): {}.",
            self.config.currencies.join(", ")
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [{ "googleSearch": {} }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "currency": { "type": "STRING" },
                            "rate": {
                                "type": "NUMBER",
                                "description": "Exchange rate value in IDR"
                            }
                        },
                        "required": ["currency", "rate"]
                    }
                }
            }
        });

        let url = format!("{ENDPOINT}/{}:generateContent?key={key}", self.config.model);
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .context("rates request failed")?
            .error_for_status()
            .context("rates endpoint rejected the request")?;

        let payload: Value = response
            .json()
            .await
            .context("rates response was not JSON")?;
        let sheet = parse_sheet(&payload)?;
        info!(quotes = sheet.quotes.len(), "fetched rate sheet");
        Ok(sheet)
    }

    /// Fetch once and deliver the outcome over the channel, caching success.
    /// Intended to run as a spawned task.
    pub async fn run(self, book: RateBook, sender: mpsc::Sender<RateEvent>) -> Result<()> {
        match self.fetch().await {
            Ok(sheet) => {
                book.store(sheet.clone());
                sender
                    .send(RateEvent::Loaded(sheet))
                    .await
                    .context("failed to send rate sheet")?;
            }
            Err(err) => {
                let _ = sender.send(RateEvent::Failed(err)).await;
            }
        }
        Ok(())
    }

    fn api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()))
    }
}

fn parse_sheet(payload: &Value) -> Result<RateSheet> {
    let candidate = payload
        .get("candidates")
        .and_then(|value| value.get(0))
        .context("rates response carried no candidates")?;
    let text = candidate
        .pointer("/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or("[]");
    let quotes: Vec<RateQuote> =
        serde_json::from_str(text).context("malformed quotes payload")?;

    let sources = candidate
        .pointer("/groundingMetadata/groundingChunks")
        .and_then(Value::as_array)
        .map(|chunks| {
            chunks
                .iter()
                .map(|chunk| RateSource {
                    title: chunk
                        .pointer("/web/title")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    uri: chunk
                        .pointer("/web/uri")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RateSheet {
        quotes,
        sources,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canned_response() -> Value {
        json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "text": "[{\"currency\":\"USD\",\"rate\":16250.0},\
                                 {\"currency\":\"SGD\",\"rate\":12100.5}]"
                    }]
                },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "title": "Kurs BI", "uri": "https://example.com/kurs" } },
                        { "web": { "uri": "https://example.com/bare" } }
                    ]
                }
            }]
        })
    }

    #[test]
    fn parses_quotes_and_sources() -> Result<()> {
        let sheet = parse_sheet(&canned_response())?;
        assert_eq!(sheet.quotes.len(), 2);
        assert_eq!(sheet.quotes[0].currency, "USD");
        assert_eq!(sheet.quotes[0].rate, 16250.0);
        assert_eq!(sheet.sources.len(), 2);
        assert_eq!(sheet.sources[0].title.as_deref(), Some("Kurs BI"));
        assert!(sheet.sources[1].title.is_none());
        Ok(())
    }

    #[test]
    fn missing_grounding_yields_empty_sources() -> Result<()> {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[]" }] }
            }]
        });
        let sheet = parse_sheet(&payload)?;
        assert!(sheet.quotes.is_empty());
        assert!(sheet.sources.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_quote_text_is_an_error() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "not json" }] }
            }]
        });
        assert!(parse_sheet(&payload).is_err());
    }

    #[test]
    fn empty_response_is_an_error() {
        assert!(parse_sheet(&json!({})).is_err());
    }

    #[test]
    fn rate_book_caches_latest_sheet() {
        let book = RateBook::new();
        assert!(book.latest().is_none());
        book.store(RateSheet {
            quotes: vec![RateQuote {
                currency: "USD".to_string(),
                rate: 16000.0,
            }],
            sources: Vec::new(),
            fetched_at: Utc::now(),
        });
        let cached = book.latest().expect("sheet cached");
        assert_eq!(cached.quotes[0].currency, "USD");
    }

    #[test]
    fn default_config_quotes_the_usual_currencies() {
        let config = RatesConfig::default();
        assert_eq!(config.currencies.len(), DEFAULT_CURRENCIES.len());
        assert!(config.currencies.iter().any(|code| code == "USD"));
        assert!(config.api_key.is_none());
    }
}
