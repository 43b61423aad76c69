//! Blocking HTTP adapters for the exchange endpoints.
//!
//! The primary endpoint returns one JSON document whose `data` array holds a record
//! per F&O symbol. The previous close is not part of it; it has to be scraped per
//! symbol from the quote page, where it sits as a JSON blob inside the element
//! `#responseDiv`.
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use screener_common::{Result, ScreenerError};
use serde_json::Value;

use crate::source::{PrevCloseSource, QuoteSource, RawRow};

/// Bulk F&O stock watch endpoint.
pub const QUOTES_URL: &str =
    "https://www.nseindia.com/live_market/dynaContent/live_watch/stock_watch/foSecStockWatch.json";
/// Per-symbol quote page; the symbol is passed as the `symbol` query parameter.
pub const PREV_CLOSE_URL: &str =
    "https://www.nseindia.com/live_market/dynaContent/live_watch/get_quote/GetQuote.jsp";
/// The exchange rejects requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

const RESPONSE_DIV: &str = "#responseDiv";

/// Endpoints and HTTP settings for [`NseClient`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Primary bulk endpoint.
    pub quotes_url: String,
    /// Secondary per-symbol endpoint.
    pub prev_close_url: String,
    /// Timeout applied to every request, primary and per-symbol alike.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            quotes_url: String::from(QUOTES_URL),
            prev_close_url: String::from(PREV_CLOSE_URL),
            timeout: Duration::from_secs(10),
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

/// Exchange client implementing both quote source traits.
pub struct NseClient {
    client: Client,
    config: SourceConfig,
}

impl NseClient {
    /// Builds the underlying HTTP client.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ScreenerError::Format(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| ScreenerError::SourceUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScreenerError::SourceUnavailable(format!(
                "{} answered {}",
                url, status
            )));
        }
        response
            .text()
            .map_err(|e| ScreenerError::SourceUnavailable(format!("{}: {}", url, e)))
    }
}

impl QuoteSource for NseClient {
    fn fetch_rows(&self) -> Result<Vec<RawRow>> {
        let body = self.get_text(&self.config.quotes_url, &[])?;
        let rows = parse_rows(&body)?;
        debug!("Fetched {} rows from {}", rows.len(), self.config.quotes_url);
        Ok(rows)
    }
}

impl PrevCloseSource for NseClient {
    fn fetch_previous_close(&self, symbol: &str) -> Result<String> {
        let html = self.get_text(&self.config.prev_close_url, &[("symbol", symbol)])?;
        extract_previous_close(&html)
            .map_err(|e| ScreenerError::SourceUnavailable(format!("{}: {}", symbol, e)))
    }
}

/// Decodes the bulk document and returns its `data` records.
pub fn parse_rows(body: &str) -> Result<Vec<RawRow>> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| ScreenerError::SourceUnavailable(format!("Undecodable quotes payload: {}", e)))?;

    let data = match document.get("data") {
        Some(Value::Array(data)) => data,
        _ => {
            return Err(ScreenerError::SourceUnavailable(String::from(
                "Quotes payload has no `data` array",
            )));
        }
    };

    data.iter()
        .enumerate()
        .map(|(position, record)| match record {
            Value::Object(map) => Ok(map.clone()),
            other => Err(ScreenerError::MalformedRow(format!(
                "Record {} is not an object: {}",
                position, other
            ))),
        })
        .collect()
}

/// Pulls `data[0].previousClose` out of the JSON embedded in a quote page.
pub fn extract_previous_close(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(RESPONSE_DIV)
        .map_err(|e| ScreenerError::Format(format!("Invalid selector {}: {:?}", RESPONSE_DIV, e)))?;

    let embedded: String = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScreenerError::Format(format!("No {} element in page", RESPONSE_DIV)))?
        .text()
        .collect();

    let payload: Value = serde_json::from_str(embedded.trim())?;
    match payload.pointer("/data/0/previousClose") {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        _ => Err(ScreenerError::Format(String::from(
            "Embedded quote has no data[0].previousClose",
        ))),
    }
}
