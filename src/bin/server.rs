use anyhow::Result;
use clap::Parser;
use cotacao::core::log::init_logging;

/// Serves the latest USD-BRL bid on GET /cotacao and records every bid served
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long)]
    config_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = cotacao::AppConfig::resolve(cli.config_path.as_deref())?;
    tracing::debug!("Loaded config: {config:#?}");

    let result = cotacao::server::run(&config).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server failed");
    }
    result
}
