use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::error;

use crate::market::{DisplayAsset, FetchError, FilterState, Listing, PriceRange, PriceUnit};
use crate::solana_rpc::RpcError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found")]
    NotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(#[from] FetchError),
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Upstream(e) => {
                error!("Listing pipeline failed: {}", e);
                (StatusCode::BAD_GATEWAY, "Failed to load marketplace listings".to_string())
            }
            ApiError::Rpc(e) => {
                error!("RPC call failed: {}", e);
                (StatusCode::BAD_GATEWAY, "RPC node unavailable".to_string())
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query string shared by the listing and asset endpoints. Every field may be
/// sent empty, which means unset.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub collection: Option<String>,
    pub collection_category: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub price_unit: Option<String>,
    pub include_inactive: Option<String>,
}

fn parse_optional<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {}: '{}'", name, text))),
    }
}

impl FilterQuery {
    pub fn into_filters(self, price_divisor: u64) -> Result<FilterState, ApiError> {
        let price_unit = match self.price_unit.as_deref() {
            None | Some("") | Some("raw") => PriceUnit::Raw,
            Some("scaled") => PriceUnit::Scaled { divisor: price_divisor },
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "price_unit must be 'raw' or 'scaled', got '{}'",
                    other
                )))
            }
        };

        let min = parse_optional::<f64>("min_price", self.min_price.as_deref())?;
        let max = parse_optional::<f64>("max_price", self.max_price.as_deref())?;
        let include_inactive =
            parse_optional::<bool>("include_inactive", self.include_inactive.as_deref())?.unwrap_or(false);

        Ok(FilterState {
            collection: self.collection.unwrap_or_default(),
            collection_category: self.collection_category.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            price_range: PriceRange { min, max },
            price_unit,
            include_inactive,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssetsResponse {
    pub assets: Vec<DisplayAsset>,
    pub count: usize,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingsResponse {
    pub listings: Vec<Listing>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub rpc_url: String,
    pub healthy: bool,
}
