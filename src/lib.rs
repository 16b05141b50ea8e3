pub mod api;
pub mod config;
pub mod market;
pub mod metrics;
pub mod solana_rpc;

pub use config::Settings;
pub use market::{DisplayAsset, FilterState, Listing, MarketplacePipeline};
pub use api::types::ApiError;
