use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_api::api::{self, AppState};
use market_api::config::{validate_settings, ApplicationSettings, Settings};
use market_api::market::MarketplacePipeline;
use market_api::metrics::{self, Metrics};
use market_api::solana_rpc::SolanaRpcClient;

#[derive(Parser)]
struct Args {
    /// Start serving even if the RPC node does not report healthy
    #[arg(long)]
    skip_health_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new().unwrap_or_else(|e| {
        error!("Failed to load configuration: {:?}", e);
        std::process::exit(1);
    });

    if let Err(e) = validate_settings(&settings) {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Loaded settings: {:?}", settings);

    let metrics = Metrics::new(metrics::setup_metrics_recorder()?);
    info!("Prometheus metrics initialized");

    let rpc = Arc::new(SolanaRpcClient::from_settings(&settings.solana_rpc));

    if args.skip_health_check {
        warn!("Skipping RPC health check");
    } else {
        match rpc.get_health().await {
            Ok(true) => info!("Solana RPC node is healthy"),
            Ok(false) => {
                error!("Solana RPC node at {} is not healthy", rpc.url());
                std::process::exit(1);
            }
            Err(e) => {
                error!("Failed to reach Solana RPC node: {:?}", e);
                std::process::exit(1);
            }
        }
    }

    let pipeline = MarketplacePipeline::from_settings(&settings, Arc::clone(&rpc))?;

    let state = Arc::new(AppState {
        pipeline,
        rpc,
        price_divisor: settings.marketplace.price_divisor,
    });

    let app = api::create_router(state)
        .route("/metrics", axum::routing::get(move || async move {
            (
                [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                metrics.render(),
            )
        }))
        .layer(cors_layer(&settings.application));

    let addr = SocketAddr::from((
        settings.application.host.parse::<std::net::IpAddr>().unwrap_or_else(|_| {
            warn!("Invalid application.host {}, binding 0.0.0.0", settings.application.host);
            std::net::IpAddr::from([0, 0, 0, 0])
        }),
        settings.application.port,
    ));

    let listener = TcpListener::bind(addr).await?;
    info!("Marketplace API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors_layer(application: &ApplicationSettings) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(application.cors_allow_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
            HeaderValue::from_static("*")
        }))
        .allow_methods(
            application.cors_allow_methods
                .split(',')
                .map(|s| s.trim().parse::<Method>().unwrap_or(Method::GET))
                .collect::<Vec<Method>>()
        )
        .allow_headers(
            application.cors_allow_headers
                .split(',')
                .map(|s| match s.trim().to_lowercase().as_str() {
                    "content-type" => header::CONTENT_TYPE,
                    "authorization" => header::AUTHORIZATION,
                    other => header::HeaderName::from_lowercase(other.as_bytes()).unwrap_or(header::CONTENT_TYPE),
                })
                .collect::<Vec<_>>()
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
