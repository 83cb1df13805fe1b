//! UAH → USD normalization performed before feature construction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CurrencyConfig;
use crate::scoring::BorrowerProfile;

const QUOTE_CURRENCY: &str = "UAH";

/// Source of the UAH-per-USD conversion rate.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn rate(&self) -> Result<f64, CurrencyError>;
}

/// Explicitly configured rate, used for offline runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(f64);

impl FixedRate {
    pub fn new(rate: f64) -> Result<Self, CurrencyError> {
        check_rate(rate).map(Self)
    }
}

#[async_trait]
impl RateProvider for FixedRate {
    async fn rate(&self) -> Result<f64, CurrencyError> {
        Ok(self.0)
    }
}

/// Client for the exchangerate-api.com `latest` endpoint.
pub struct ExchangeRateClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    conversion_rates: HashMap<String, f64>,
}

impl ExchangeRateClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CurrencyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CurrencyError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn latest_url(&self) -> String {
        format!(
            "{}/{}/latest/USD",
            self.base_url.trim_end_matches('/'),
            self.api_key
        )
    }
}

#[async_trait]
impl RateProvider for ExchangeRateClient {
    async fn rate(&self) -> Result<f64, CurrencyError> {
        let response = self
            .client
            .get(self.latest_url())
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "exchange rate request failed");
                CurrencyError::Request(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "exchange rate service returned an error");
            return Err(CurrencyError::Status(status.as_u16()));
        }

        let latest: LatestRates = response.json().await.map_err(CurrencyError::Request)?;
        let rate = latest
            .conversion_rates
            .get(QUOTE_CURRENCY)
            .copied()
            .ok_or(CurrencyError::MissingRate(QUOTE_CURRENCY))?;

        debug!(rate, "fetched {QUOTE_CURRENCY} exchange rate");
        check_rate(rate)
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(
    config: &CurrencyConfig,
) -> Result<Arc<dyn RateProvider>, CurrencyError> {
    if let Some(rate) = config.fixed_rate {
        return Ok(Arc::new(FixedRate::new(rate)?));
    }

    let api_key = config
        .api_key
        .clone()
        .ok_or(CurrencyError::MissingApiKey)?;
    let client = ExchangeRateClient::new(config.base_url.clone(), api_key, config.timeout)?;
    Ok(Arc::new(client))
}

/// Divide every currency-denominated field by `rate`; zero amounts stay zero.
pub fn convert_to_usd(profile: &BorrowerProfile, rate: f64) -> BorrowerProfile {
    let mut converted = profile.clone();
    for amount in converted.currency_amounts_mut() {
        if *amount != 0.0 {
            *amount /= rate;
        }
    }
    converted
}

fn check_rate(rate: f64) -> Result<f64, CurrencyError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(CurrencyError::InvalidRate(rate))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CurrencyError {
    #[error("unable to build exchange rate client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("exchange rate request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("exchange rate service responded with status {0}")]
    Status(u16),
    #[error("exchange rate response has no {0} rate")]
    MissingRate(&'static str),
    #[error("exchange rate {0} is not a positive number")]
    InvalidRate(f64),
    #[error("APP_EXCHANGE_API_KEY must be set unless APP_EXCHANGE_FIXED_RATE is configured")]
    MissingApiKey,
}
