//! Rate persistence abstractions

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::QuoteError;

/// A stored bid. Rows are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersistedRate {
    pub id: i64,
    pub bid: String,
    pub timestamp: NaiveDateTime,
}

#[async_trait]
pub trait RateStore: Send + Sync {
    /// Creates the rate table when it is missing. Safe to call repeatedly.
    async fn initialize_schema(&self) -> Result<(), QuoteError>;

    /// Appends one row holding `bid`.
    async fn persist_bid(&self, bid: &str) -> Result<(), QuoteError>;
}
