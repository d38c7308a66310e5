//! Yahoo Finance Symbol Lookup
//!
//! Thin client used to reject trades on tickers the market data
//! provider has never heard of. A symbol "exists" when its quote
//! carries a regular market price.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/quote";

#[derive(Clone)]
pub struct SymbolClient {
    client: reqwest::Client,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
}

impl SymbolClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .build()
                .unwrap(),
        }
    }

    /// Whether the provider recognizes the symbol.
    ///
    /// A missing result or a result without `regularMarketPrice` means
    /// unknown; transport failures surface as errors so a provider
    /// outage never silently rejects valid tickers.
    pub async fn symbol_exists(&self, symbol: &str) -> Result<bool> {
        let json = self.fetch_quote_json(symbol).await?;

        let known = json
            .get("quoteResponse")
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|quote| quote.get("regularMarketPrice"))
            .is_some();

        if !known {
            tracing::debug!(symbol, "symbol not recognized by quote provider");
        }
        Ok(known)
    }

    /// Get the current quote for a symbol
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let json = self.fetch_quote_json(symbol).await?;

        let quote = json
            .get("quoteResponse")
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| anyhow!("No quote data found for {}", symbol))?;

        let price = quote
            .get("regularMarketPrice")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow!("No market price for {}", symbol))?;

        Ok(Quote { symbol: symbol.to_string(), price })
    }

    async fn fetch_quote_json(&self, symbol: &str) -> Result<serde_json::Value> {
        let url = format!("{}?symbols={}", QUOTE_URL, symbol);

        let response = self.client.get(&url).send().await?;
        let json: serde_json::Value = response.json().await?;

        Ok(json)
    }
}

impl Default for SymbolClient {
    fn default() -> Self {
        Self::new()
    }
}
