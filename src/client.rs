//! One-shot consumer of the quote endpoint.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::core::error::{QuoteError, Stage};
use crate::core::quote::SimplifiedQuote;

pub struct QuoteClient {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl QuoteClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cotacao/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(QuoteClient {
            endpoint: endpoint.to_string(),
            timeout,
            client,
        })
    }

    /// Requests the current quote. Any non-200 answer is returned as
    /// [`QuoteError::Status`] carrying the server's error body.
    pub async fn fetch_quote(&self) -> Result<SimplifiedQuote, QuoteError> {
        tokio::time::timeout(self.timeout, self.request())
            .await
            .map_err(|_| QuoteError::timeout(Stage::Request, self.timeout))?
    }

    async fn request(&self) -> Result<SimplifiedQuote, QuoteError> {
        debug!("Requesting quote from {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await?;
            return Err(QuoteError::Status { status, body });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Overwrites `path` with `Dólar: <bid>`, readable by everyone and writable by the owner.
pub fn write_artifact(path: &Path, bid: &str) -> Result<(), QuoteError> {
    std::fs::write(path, format!("Dólar: {bid}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
    }

    debug!(path = %path.display(), "Wrote quote artifact");
    Ok(())
}

/// Fetches the quote and records it. The artifact is untouched unless the fetch succeeds.
pub async fn run(config: &AppConfig) -> Result<SimplifiedQuote> {
    let client = QuoteClient::new(&config.server_url, config.client_timeout)
        .context("Failed to build HTTP client")?;

    let quote = client
        .fetch_quote()
        .await
        .with_context(|| format!("Failed to get quote from {}", config.server_url))?;

    write_artifact(&config.output_path, &quote.bid).with_context(|| {
        format!(
            "Failed to write quote to {}",
            config.output_path.display()
        )
    })?;

    info!(bid = %quote.bid, path = %config.output_path.display(), "Bid saved");
    Ok(quote)
}
