//! USD→IDR conversion with a fixed fallback
//!
//! A missing rate must never block ingestion of the underlying price data,
//! so this component degrades to a known constant instead of failing.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Applied whenever the rate service cannot produce a usable quote.
pub const FALLBACK_USD_IDR_RATE: Decimal = dec!(16000);

const RATE_CACHE_KEY: &str = "usd-idr";

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Always yields a positive rate; degradation is handled internally.
    async fn usd_to_idr(&self) -> Decimal;
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
    cache: Cache<&'static str, Decimal>,
}

impl ExchangeRateClient {
    pub fn new(base_url: String) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap(),
            base_url,
            cache,
        }
    }

    async fn fetch_rate(&self) -> Result<Decimal, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/v6/latest/USD", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("rate service error {}", response.status()).into());
        }

        let payload: RateResponse = response.json().await?;
        parse_idr_rate(&payload)
    }
}

#[async_trait]
impl RateSource for ExchangeRateClient {
    async fn usd_to_idr(&self) -> Decimal {
        if let Some(rate) = self.cache.get(RATE_CACHE_KEY).await {
            return rate;
        }

        match self.fetch_rate().await {
            Ok(rate) => {
                self.cache.insert(RATE_CACHE_KEY, rate).await;
                rate
            }
            Err(e) => {
                tracing::warn!(
                    "USD/IDR rate fetch failed, using fallback {}: {}",
                    FALLBACK_USD_IDR_RATE,
                    e
                );
                FALLBACK_USD_IDR_RATE
            }
        }
    }
}

fn parse_idr_rate(payload: &RateResponse) -> Result<Decimal, Box<dyn std::error::Error + Send + Sync>> {
    if payload.result != "success" {
        return Err(format!("rate service reported result {:?}", payload.result).into());
    }

    let rate = payload
        .rates
        .get("IDR")
        .copied()
        .ok_or("IDR rate missing from response")?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(format!("unusable IDR rate: {}", rate).into());
    }

    Decimal::from_f64_retain(rate).ok_or_else(|| format!("IDR rate is not representable: {}", rate).into())
}
