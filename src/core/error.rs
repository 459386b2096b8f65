//! Error types shared by the fetcher, the store and the client.

use std::fmt::Display;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// The pipeline step a deadline was attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Outbound call to the origin API.
    Fetch,
    /// Insert into the rate table.
    Persist,
    /// Client call to the quote endpoint.
    Request,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Stage::Fetch => "fetch",
                Stage::Persist => "persist",
                Stage::Request => "request",
            }
        )
    }
}

#[derive(Error, Debug)]
pub enum QuoteError {
    /// The operation did not finish before its deadline and was dropped.
    #[error("{stage} timed out after {}ms", .limit.as_millis())]
    Timeout { stage: Stage, limit: Duration },

    /// Network-level failure reaching a remote endpoint.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote endpoint answered with a non-success status.
    #[error("HTTP error: {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Malformed or unexpected JSON shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Durable write failure other than a timeout.
    #[error("Database error: {0}")]
    Persist(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuoteError {
    pub fn timeout(stage: Stage, limit: Duration) -> Self {
        QuoteError::Timeout { stage, limit }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, QuoteError::Timeout { .. })
    }
}
