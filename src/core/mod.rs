//! Core types and capability traits

pub mod config;
pub mod error;
pub mod log;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use error::{QuoteError, Stage};
pub use quote::{ExternalQuoteRecord, QuoteProvider, SimplifiedQuote};
pub use store::{PersistedRate, RateStore};
