mod commands;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricepulse")]
#[command(about = "Discover products, competitor prices and competitors from company websites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract products and retailer prices from a website.
    Products {
        url: String,
        /// Market to search retailers in; defaults to `PRICEPULSE_DEFAULT_LOCALE`.
        #[arg(long)]
        locale: Option<String>,
    },
    /// Extract products with extra free-form instructions for the model.
    Modify {
        url: String,
        #[arg(long)]
        instructions: String,
        #[arg(long)]
        locale: Option<String>,
    },
    /// List the competitors of the company behind a website.
    Competitors {
        url: String,
        #[arg(long)]
        locale: Option<String>,
    },
    /// Analyse the product catalogs of one or more competitor domains.
    Analyze {
        #[arg(required = true)]
        domains: Vec<String>,
        /// Print per-product analysis records instead of batch results.
        #[arg(long)]
        records: bool,
    },
    /// Send a raw prompt and print the reply.
    Ask { prompt: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = pricepulse_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pipeline = Arc::new(commands::build_pipeline(&config)?);

    match cli.command {
        Commands::Products { url, locale } => {
            commands::run_products(&pipeline, &url, locale.as_deref()).await
        }
        Commands::Modify {
            url,
            instructions,
            locale,
        } => commands::run_modify(&pipeline, &url, locale.as_deref(), &instructions).await,
        Commands::Competitors { url, locale } => {
            commands::run_competitors(&pipeline, &url, locale.as_deref()).await
        }
        Commands::Analyze { domains, records } => {
            commands::run_analyze(pipeline, config.analysis_concurrency, &domains, records).await
        }
        Commands::Ask { prompt } => commands::run_ask(&pipeline, &prompt).await,
    }
}
