use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use super::image::ImageResolver;
use super::listing::Listing;
use super::metadata::MetadataSource;
use crate::metrics;
use crate::solana_rpc::Pubkey;

/// Listing-side values copied onto a hydrated asset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFields {
    pub seller: String,
    pub price: Option<u64>,
    pub listing: String,
}

impl From<&Listing> for ListingFields {
    fn from(listing: &Listing) -> Self {
        Self {
            seller: listing.seller.to_string(),
            price: Some(listing.price),
            listing: listing.address.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAsset {
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub group: String,
    pub mint: String,
    pub seller: String,
    pub price: Option<u64>,
    pub listing: String,
}

#[derive(Clone)]
pub struct DetailHydrator {
    metadata: Arc<dyn MetadataSource>,
    images: ImageResolver,
}

impl DetailHydrator {
    pub fn new(metadata: Arc<dyn MetadataSource>, images: ImageResolver) -> Self {
        Self { metadata, images }
    }

    /// Merges token metadata for `mint` with `fields`. Returns `None` when the
    /// metadata cannot be read or carries no URI.
    pub async fn hydrate(&self, mint: &Pubkey, fields: ListingFields) -> Option<DisplayAsset> {
        let metadata = match self.metadata.token_metadata(mint).await {
            Ok(Some(metadata)) if !metadata.uri.is_empty() => metadata,
            Ok(_) => {
                warn!("Metadata URI is missing for mint {}", mint);
                metrics::record_hydration_failure();
                return None;
            }
            Err(e) => {
                error!("Error fetching NFT details for {}: {}", mint, e);
                metrics::record_hydration_failure();
                return None;
            }
        };

        let image = self.images.resolve(&metadata.uri).await;
        metrics::record_asset_hydrated();

        Some(DisplayAsset {
            group: metadata.group().to_string(),
            name: metadata.name,
            symbol: metadata.symbol,
            image,
            mint: mint.to_string(),
            seller: fields.seller,
            price: fields.price,
            listing: fields.listing,
        })
    }
}
