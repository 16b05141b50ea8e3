use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_api::config::{validate_settings, Settings};
use market_api::market::{FilterState, MarketplacePipeline, PriceRange, PriceUnit};
use market_api::solana_rpc::{Pubkey, SolanaRpcClient};

/// Runs the marketplace pipeline once and prints the hydrated assets as JSON.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "")]
    collection: String,
    #[arg(long, default_value = "")]
    collection_category: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long = "type", default_value = "")]
    kind: String,
    #[arg(long)]
    min_price: Option<f64>,
    #[arg(long)]
    max_price: Option<f64>,
    /// Compare prices in whole units (raw price / marketplace.price_divisor)
    #[arg(long)]
    scaled: bool,
    /// Print only the asset for this mint
    #[arg(long)]
    mint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    validate_settings(&settings)?;

    let rpc = Arc::new(SolanaRpcClient::from_settings(&settings.solana_rpc));
    let pipeline = MarketplacePipeline::from_settings(&settings, rpc)?;

    if let Some(mint) = args.mint {
        let mint = mint
            .parse::<Pubkey>()
            .map_err(|e| anyhow::anyhow!("invalid mint {}: {}", mint, e))?;
        match pipeline.asset_detail(&mint).await {
            Some(asset) => println!("{}", serde_json::to_string_pretty(&asset)?),
            None => {
                error!("No metadata available for {}", mint);
                std::process::exit(2);
            }
        }
        return Ok(());
    }

    let filters = FilterState {
        collection: args.collection,
        collection_category: args.collection_category,
        category: args.category,
        kind: args.kind,
        price_range: PriceRange {
            min: args.min_price,
            max: args.max_price,
        },
        price_unit: if args.scaled {
            PriceUnit::Scaled { divisor: settings.marketplace.price_divisor }
        } else {
            PriceUnit::Raw
        },
        include_inactive: false,
    };

    let assets = pipeline.marketplace_assets(&filters).await?;
    info!("Fetched {} assets", assets.len());
    println!("{}", serde_json::to_string_pretty(&assets)?);

    Ok(())
}
