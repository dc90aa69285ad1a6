//! Market listings client
//!
//! Single-shot fetch of the top ranked listings from the market-data
//! HTTP API. No retry, no backoff: one failure is surfaced once and
//! the caller decides whether to keep its previous snapshot.

use crate::{
    constants::{
        API_KEY_ENV, API_KEY_HEADER, LISTINGS_LATEST_ENDPOINT, MARKET_API_URL,
        REQUEST_TIMEOUT_SECS, USER_AGENT,
    },
    error::MarketError,
    types::{ListingsSnapshot, MarketListing},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Trait for market listings providers
#[async_trait]
pub trait ListingsProvider: Send + Sync {
    /// Fetches the top `limit` listings, ranked by market capitalization
    ///
    /// The returned order is exactly the provider's order.
    async fn fetch_top_listings(&self, limit: usize) -> Result<ListingsSnapshot, MarketError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Listings API response shape
#[derive(Debug, Deserialize)]
struct ListingsResponse {
    data: Vec<ListingEntry>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    symbol: String,
    slug: String,
    quote: QuoteMap,
}

#[derive(Debug, Deserialize)]
struct QuoteMap {
    #[serde(rename = "USD")]
    usd: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: f64,
    percent_change_24h: Option<f64>,
}

/// CoinMarketCap-style listings client
pub struct CmcListingsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CmcListingsClient {
    /// Creates a client with the given API credential
    pub fn new(api_key: impl Into<String>) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(MarketError::Network)?;

        Ok(Self {
            client,
            base_url: MARKET_API_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Creates a client reading the credential from the environment
    pub fn from_env() -> Result<Self, MarketError> {
        let api_key =
            std::env::var(API_KEY_ENV).map_err(|_| MarketError::MissingApiKey(API_KEY_ENV))?;
        Self::new(api_key)
    }

    /// Overrides the API host, for tests
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self, limit: usize) -> String {
        format!(
            "{}{}?limit={}",
            self.base_url, LISTINGS_LATEST_ENDPOINT, limit
        )
    }

    /// Parses the listings body into provider-ordered entries
    fn parse_body(body: &str) -> Result<Vec<MarketListing>, MarketError> {
        let response: ListingsResponse = serde_json::from_str(body).map_err(|e| {
            MarketError::invalid_response(format!("failed to parse listings response: {e}"))
        })?;

        Ok(response
            .data
            .into_iter()
            .map(|entry| MarketListing {
                name: entry.name,
                symbol: entry.symbol,
                slug: entry.slug,
                price_usd: entry.quote.usd.price,
                percent_change_24h: entry.quote.usd.percent_change_24h,
            })
            .collect())
    }
}

#[async_trait]
impl ListingsProvider for CmcListingsClient {
    async fn fetch_top_listings(&self, limit: usize) -> Result<ListingsSnapshot, MarketError> {
        let url = self.build_url(limit);
        tracing::debug!(url = %url, "fetching top listings");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(MarketError::Network)?;

        if !response.status().is_success() {
            return Err(MarketError::api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response.text().await.map_err(MarketError::Network)?;
        let listings = Self::parse_body(&body)?;

        tracing::debug!(count = listings.len(), "fetched top listings");
        Ok(ListingsSnapshot::new(listings))
    }

    fn provider_name(&self) -> &'static str {
        "coinmarketcap"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_BODY: &str = r#"{
        "data": [
            {
                "name": "Bitcoin",
                "symbol": "BTC",
                "slug": "bitcoin",
                "quote": { "USD": { "price": 63250.12, "percent_change_24h": -1.25 } }
            },
            {
                "name": "Ethereum",
                "symbol": "ETH",
                "slug": "ethereum",
                "quote": { "USD": { "price": 3050.9, "percent_change_24h": 2.4 } }
            }
        ]
    }"#;

    #[test]
    fn parses_listings_in_provider_order() {
        let listings = CmcListingsClient::parse_body(SAMPLE_BODY).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].symbol, "BTC");
        assert_eq!(listings[0].slug, "bitcoin");
        assert_eq!(listings[0].price_usd, 63250.12);
        assert_eq!(listings[0].percent_change_24h, Some(-1.25));
        assert_eq!(listings[1].symbol, "ETH");
    }

    #[test]
    fn missing_change_percentage_is_absent() {
        let body = r#"{
            "data": [
                {
                    "name": "Tether",
                    "symbol": "USDT",
                    "slug": "tether",
                    "quote": { "USD": { "price": 1.0 } }
                }
            ]
        }"#;
        let listings = CmcListingsClient::parse_body(body).unwrap();
        assert_eq!(listings[0].percent_change_24h, None);
    }

    #[test]
    fn malformed_body_is_invalid_response() {
        let result = CmcListingsClient::parse_body("{\"data\": 42}");
        assert!(matches!(result, Err(MarketError::InvalidResponse(_))));
    }

    #[test]
    fn url_carries_the_requested_limit() {
        let client = CmcListingsClient::new("test-key")
            .unwrap()
            .with_base_url("http://localhost:9999");
        assert_eq!(
            client.build_url(5),
            "http://localhost:9999/v1/cryptocurrency/listings/latest?limit=5"
        );
    }
}
