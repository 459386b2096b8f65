//! Subscriber setup for the server and client binaries.

use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Installs the global subscriber.
///
/// A non-empty `RUST_LOG` is used as the whole filter. Without it this crate
/// logs at `info` (`debug` when `verbose`) and every other target at `warn`.
pub fn init_logging(verbose: bool) {
    let directives = filter_directives(std::env::var(EnvFilter::DEFAULT_ENV).ok(), verbose);
    let filter = EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(None, verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(filter)
        .init();
}

fn filter_directives(rust_log: Option<String>, verbose: bool) -> String {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => {
            let level = if verbose { "debug" } else { "info" };
            format!("warn,cotacao={level}")
        }
    }
}
