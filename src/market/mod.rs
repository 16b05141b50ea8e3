pub mod fetcher;
pub mod filter;
pub mod hydrator;
pub mod image;
pub mod listing;
pub mod metadata;
pub mod pipeline;

#[cfg(test)]
pub mod test_helpers;

pub use fetcher::{AccountSource, FetchError, ListingFetcher};
pub use filter::{FilterState, PriceRange, PriceUnit};
pub use hydrator::{DetailHydrator, DisplayAsset, ListingFields};
pub use image::{DocumentFetcher, HttpDocumentFetcher, ImageResolver};
pub use listing::{AnchorListingDecoder, DecodeError, Listing, ListingDecoder};
pub use metadata::{MetadataError, MetadataSource, RpcMetadataSource, TokenMetadata};
pub use pipeline::MarketplacePipeline;
