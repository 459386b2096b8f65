use anyhow::Result;
use clap::Parser;
use cotacao::core::log::init_logging;

/// Fetches the current bid from the quote server and saves it to a file
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

    // Returning the error exits non-zero with the full context chain on stderr
    if let Err(e) = cotacao::client::run(&config).await {
        tracing::error!(error = %e, "Client failed");
        return Err(e);
    }

    println!("Process finished successfully. Bid saved.");
    Ok(())
}
