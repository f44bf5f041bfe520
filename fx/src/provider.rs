//! Rate source trait and implementations.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::rate_table::RateTable;

/// Trait for exchange rate data sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch a complete rate table.
    async fn fetch(&self) -> FxResult<RateTable>;
}

/// Fetches the rate table with a JSON GET request.
///
/// No caching is done here; the provider's HTTP cache headers apply.
pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    /// Create a source for the given URL.
    pub fn new(url: impl Into<String>) -> FxResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FxError::DataLoadFailed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The URL this source fetches.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> FxResult<RateTable> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FxError::DataLoadFailed(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FxError::DataLoadFailed(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FxError::DataLoadFailed(format!("failed to decode response: {}", e)))?;

        debug!(url = %self.url, "Fetched rate data");

        RateTable::from_value(body, self.url.clone())
    }
}

/// Rate source returning a fixed payload, for headless runs and tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct StaticRateSource {
    name: String,
    payload: Result<Value, String>,
}

#[cfg(any(test, feature = "test-utils"))]
impl StaticRateSource {
    /// Serve the given JSON payload on every fetch.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload: Ok(payload),
        }
    }

    /// Fail every fetch with the given reason.
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Err(reason.into()),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for StaticRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FxResult<RateTable> {
        match &self.payload {
            Ok(value) => RateTable::from_value(value.clone(), self.name.clone()),
            Err(reason) => Err(FxError::DataLoadFailed(reason.clone())),
        }
    }
}
