use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::filter::FilterState;
use super::listing::{DecodeError, Listing, ListingDecoder};
use crate::metrics;
use crate::solana_rpc::{ProgramAccount, Pubkey, RpcError, SolanaRpcClient};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Bulk account reads by owning program.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<ProgramAccount>, RpcError>;
}

#[async_trait]
impl AccountSource for SolanaRpcClient {
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        data_size: u64,
    ) -> Result<Vec<ProgramAccount>, RpcError> {
        self.get_program_accounts(program_id, data_size).await
    }
}

#[derive(Clone)]
pub struct ListingFetcher {
    source: Arc<dyn AccountSource>,
    decoder: Arc<dyn ListingDecoder>,
    program_id: Pubkey,
    data_size: u64,
}

impl ListingFetcher {
    pub fn new(
        source: Arc<dyn AccountSource>,
        decoder: Arc<dyn ListingDecoder>,
        program_id: Pubkey,
        data_size: u64,
    ) -> Self {
        Self {
            source,
            decoder,
            program_id,
            data_size,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Every listing account of the program, decoded, in the order the node
    /// returned them. A single undecodable account fails the whole call.
    pub async fn all_listings(&self) -> Result<Vec<Listing>, FetchError> {
        let accounts = self
            .source
            .program_accounts(&self.program_id, self.data_size)
            .await?;

        let listings = accounts
            .iter()
            .map(|account| self.decoder.decode(account.pubkey, &account.account.data))
            .collect::<Result<Vec<_>, _>>()?;

        metrics::record_listings_fetched(listings.len());
        Ok(listings)
    }

    pub async fn fetch_listings(&self, filters: &FilterState) -> Result<Vec<Listing>, FetchError> {
        let listings = self.all_listings().await?;
        let total = listings.len();

        let filtered: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| filters.matches(listing))
            .collect();

        if filters.is_empty() {
            debug!("{} of {} listings active", filtered.len(), total);
        } else {
            info!("{} of {} listings matched filters {:?}", filtered.len(), total, filters);
        }

        Ok(filtered)
    }

    /// The first active listing for `mint`, if any.
    pub async fn listing_for_mint(&self, mint: &Pubkey) -> Result<Option<Listing>, FetchError> {
        let listings = self.fetch_listings(&FilterState::default()).await?;
        Ok(listings.into_iter().find(|listing| &listing.mint == mint))
    }
}
