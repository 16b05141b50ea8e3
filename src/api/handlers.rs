use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::types::{ApiError, AssetsResponse, FilterQuery, HealthResponse, ListingsResponse};
use crate::market::{DisplayAsset, MarketplacePipeline};
use crate::solana_rpc::{Pubkey, SolanaRpcClient};

pub struct AppState {
    pub pipeline: MarketplacePipeline,
    pub rpc: Arc<SolanaRpcClient>,
    pub price_divisor: u64,
}

pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let healthy = state.rpc.get_health().await?;

    Ok(Json(HealthResponse {
        rpc_url: state.rpc.url().to_string(),
        healthy,
    }))
}

pub async fn get_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let filters = query.into_filters(state.price_divisor)?;
    let listings = state.pipeline.fetcher().fetch_listings(&filters).await?;

    Ok(Json(ListingsResponse {
        count: listings.len(),
        listings,
    }))
}

pub async fn get_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<AssetsResponse>, ApiError> {
    let filters = query.into_filters(state.price_divisor)?;
    debug!("Loading marketplace assets with {:?}", filters);

    let assets = state.pipeline.marketplace_assets(&filters).await?;
    info!("Serving {} marketplace assets", assets.len());

    Ok(Json(AssetsResponse {
        count: assets.len(),
        assets,
        fetched_at: Utc::now(),
    }))
}

pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(mint): Path<String>,
) -> Result<Json<DisplayAsset>, ApiError> {
    let mint = mint
        .parse::<Pubkey>()
        .map_err(|e| ApiError::BadRequest(format!("invalid mint address: {}", e)))?;

    state
        .pipeline
        .asset_detail(&mint)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}
