//! Quote types and the fetcher abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::QuoteError;

/// Full USD-BRL quote as published by the origin API.
///
/// Every field is kept as text so that the bid reaches the store and the
/// client exactly as the origin formatted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalQuoteRecord {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    pub timestamp: String,
    pub create_date: String,
}

/// Payload handed to the downstream client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedQuote {
    pub bid: String,
}

impl From<ExternalQuoteRecord> for SimplifiedQuote {
    fn from(record: ExternalQuoteRecord) -> Self {
        SimplifiedQuote { bid: record.bid }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self) -> Result<ExternalQuoteRecord, QuoteError>;
}
