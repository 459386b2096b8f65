//! HTTP front of the pipeline: fetch the origin quote, record the bid, answer the client.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::core::config::AppConfig;
use crate::core::quote::{QuoteProvider, SimplifiedQuote};
use crate::core::store::RateStore;
use crate::providers::AwesomeApiProvider;
use crate::store::SqliteRateStore;

pub const QUOTE_ROUTE: &str = "/cotacao";

pub const FETCH_FAILED_MESSAGE: &str = "Error fetching exchange rate";
pub const PERSIST_FAILED_MESSAGE: &str = "Error saving exchange rate to database";

/// Dependencies of the quote handler, shared by every request.
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn RateStore>,
}

impl AppState {
    pub fn new(provider: Arc<dyn QuoteProvider>, store: Arc<dyn RateStore>) -> Self {
        AppState { provider, store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(QUOTE_ROUTE, get(get_quote))
        .with_state(state)
}

/// Each step gates the next; the client gets the bid only once it is stored.
async fn get_quote(State(state): State<AppState>) -> Response {
    let record = match state.provider.fetch_quote().await {
        Ok(record) => record,
        Err(e) => {
            error!(error = %e, "Error fetching exchange rate");
            return (StatusCode::REQUEST_TIMEOUT, FETCH_FAILED_MESSAGE).into_response();
        }
    };

    if let Err(e) = state.store.persist_bid(&record.bid).await {
        error!(error = %e, bid = %record.bid, "Error saving exchange rate to database");
        return (StatusCode::INTERNAL_SERVER_ERROR, PERSIST_FAILED_MESSAGE).into_response();
    }

    info!(bid = %record.bid, "Served exchange rate");
    Json(SimplifiedQuote::from(record)).into_response()
}

/// Runs the quote server until Ctrl-C.
pub async fn run(config: &AppConfig) -> Result<()> {
    let store = SqliteRateStore::connect(&config.database_path, config.persist_timeout)
        .await
        .with_context(|| {
            format!(
                "Failed to open database: {}",
                config.database_path.display()
            )
        })?;
    store
        .initialize_schema()
        .await
        .context("Failed to create rate table")?;

    let provider = AwesomeApiProvider::new(&config.origin_url, config.fetch_timeout)
        .context("Failed to build origin client")?;

    let app = router(AppState::new(Arc::new(provider), Arc::new(store)));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Server started on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
