use anyhow::{anyhow, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::fetcher::{FetchError, ListingFetcher};
use super::filter::FilterState;
use super::hydrator::{DetailHydrator, DisplayAsset, ListingFields};
use super::image::{HttpDocumentFetcher, ImageResolver};
use super::listing::AnchorListingDecoder;
use super::metadata::RpcMetadataSource;
use crate::config::Settings;
use crate::metrics;
use crate::solana_rpc::{Pubkey, SolanaRpcClient};

/// Listing fetch followed by bounded, order-preserving hydration.
#[derive(Clone)]
pub struct MarketplacePipeline {
    fetcher: ListingFetcher,
    hydrator: DetailHydrator,
    concurrency: usize,
}

impl MarketplacePipeline {
    pub fn new(fetcher: ListingFetcher, hydrator: DetailHydrator, concurrency: usize) -> Self {
        Self {
            fetcher,
            hydrator,
            concurrency: concurrency.max(1),
        }
    }

    /// Wires the RPC-backed sources from configuration.
    pub fn from_settings(settings: &Settings, rpc: Arc<SolanaRpcClient>) -> Result<Self> {
        let marketplace = &settings.marketplace;
        let program_id = marketplace
            .program_id
            .parse::<Pubkey>()
            .map_err(|e| anyhow!("invalid marketplace program id: {}", e))?;

        let fetcher = ListingFetcher::new(
            rpc.clone(),
            Arc::new(AnchorListingDecoder::default()),
            program_id,
            marketplace.listing_data_size,
        );
        let images = ImageResolver::new(
            Arc::new(HttpDocumentFetcher::new(marketplace.metadata_timeout())),
            marketplace.image_extensions.clone(),
        );
        let hydrator = DetailHydrator::new(Arc::new(RpcMetadataSource::new(rpc)), images);

        info!(
            "Marketplace pipeline ready for program {} (record size {}, concurrency {})",
            program_id, marketplace.listing_data_size, marketplace.hydration_concurrency
        );

        Ok(Self::new(fetcher, hydrator, marketplace.hydration_concurrency))
    }

    pub fn fetcher(&self) -> &ListingFetcher {
        &self.fetcher
    }

    /// Hydrated assets for every listing matching `filters`, in listing
    /// order. Listings whose metadata cannot be read are dropped.
    pub async fn marketplace_assets(&self, filters: &FilterState) -> Result<Vec<DisplayAsset>, FetchError> {
        let started = Instant::now();
        let listings = self.fetcher.fetch_listings(filters).await?;
        let requested = listings.len();

        let hydrated: Vec<Option<DisplayAsset>> = stream::iter(listings)
            .map(|listing| {
                let hydrator = self.hydrator.clone();
                async move {
                    let fields = ListingFields::from(&listing);
                    hydrator.hydrate(&listing.mint, fields).await
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let assets: Vec<DisplayAsset> = hydrated.into_iter().flatten().collect();

        metrics::record_pipeline_duration(started.elapsed());
        debug!(
            "Hydrated {} of {} listings in {:?}",
            assets.len(),
            requested,
            started.elapsed()
        );

        Ok(assets)
    }

    /// One asset by mint. Listing fields come from the active listing for the
    /// mint when there is one and are left empty otherwise, including when
    /// the listings cannot be loaded.
    pub async fn asset_detail(&self, mint: &Pubkey) -> Option<DisplayAsset> {
        let fields = match self.fetcher.listing_for_mint(mint).await {
            Ok(listing) => listing.as_ref().map(ListingFields::from).unwrap_or_default(),
            Err(e) => {
                warn!("Listing lookup for {} failed, showing metadata only: {}", mint, e);
                ListingFields::default()
            }
        };

        self.hydrator.hydrate(mint, fields).await
    }
}
