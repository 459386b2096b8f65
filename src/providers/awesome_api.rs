use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::core::error::{QuoteError, Stage};
use crate::core::quote::{ExternalQuoteRecord, QuoteProvider};

#[derive(Debug, Deserialize)]
struct AwesomeApiResponse {
    #[serde(rename = "USDBRL")]
    usdbrl: ExternalQuoteRecord,
}

/// Fetches the last USD-BRL quote from AwesomeAPI, bounded by a fixed deadline.
pub struct AwesomeApiProvider {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AwesomeApiProvider {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cotacao/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(AwesomeApiProvider {
            url: url.to_string(),
            timeout,
            client,
        })
    }

    async fn request(&self) -> Result<ExternalQuoteRecord, QuoteError> {
        debug!("Requesting quote from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(QuoteError::Status { status, body });
        }

        let text = response.text().await?;
        let data: AwesomeApiResponse = serde_json::from_str(&text).map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse quote response");
            QuoteError::from(e)
        })?;

        Ok(data.usdbrl)
    }
}

#[async_trait]
impl QuoteProvider for AwesomeApiProvider {
    #[instrument(name = "OriginQuoteFetch", skip(self))]
    async fn fetch_quote(&self) -> Result<ExternalQuoteRecord, QuoteError> {
        // Dropping the request future on expiry aborts the connection.
        let record = tokio::time::timeout(self.timeout, self.request())
            .await
            .map_err(|_| QuoteError::timeout(Stage::Fetch, self.timeout))??;

        debug!(bid = %record.bid, "Received origin quote");
        Ok(record)
    }
}
