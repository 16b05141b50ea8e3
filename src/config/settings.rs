use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub solana_rpc: SolanaRpcSettings,
    #[serde(default)]
    pub marketplace: MarketplaceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    #[serde(default = "default_cors_origin")]
    pub cors_allow_origin: String,
    #[serde(default = "default_cors_methods")]
    pub cors_allow_methods: String,
    #[serde(default = "default_cors_headers")]
    pub cors_allow_headers: String,
}

// Default functions for CORS settings
fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_cors_methods() -> String {
    "GET, OPTIONS".to_string()
}

fn default_cors_headers() -> String {
    "Content-Type, Authorization".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SolanaRpcSettings {
    pub url: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SolanaRpcSettings {
    fn default() -> Self {
        let url = env::var("SOLANA_RPC__URL")
            .or_else(|_| env::var("SOLANA_RPC_URL"))
            .unwrap_or_else(|_| "https://api.devnet.solana.com".to_string());
        Self {
            url,
            commitment: default_commitment(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl SolanaRpcSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceSettings {
    #[serde(default = "default_program_id")]
    pub program_id: String,
    /// Byte length of a listing account, discriminator included.
    #[serde(default = "default_listing_data_size")]
    pub listing_data_size: u64,
    #[serde(default = "default_hydration_concurrency")]
    pub hydration_concurrency: usize,
    /// Divisor applied to raw prices when a filter asks for scaled units.
    #[serde(default = "default_price_divisor")]
    pub price_divisor: u64,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_seconds: u64,
}

fn default_program_id() -> String {
    "FX2TuF4AsoxvbkNC95CK5RGdkpdMWFsPszULZy68Kexp".to_string()
}

fn default_listing_data_size() -> u64 {
    80 + 8
}

fn default_hydration_concurrency() -> usize {
    8
}

fn default_price_divisor() -> u64 {
    1_000_000
}

fn default_image_extensions() -> Vec<String> {
    vec!["jpeg".to_string(), "png".to_string(), "jpg".to_string()]
}

fn default_metadata_timeout() -> u64 {
    15
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            listing_data_size: default_listing_data_size(),
            hydration_concurrency: default_hydration_concurrency(),
            price_divisor: default_price_divisor(),
            image_extensions: default_image_extensions(),
            metadata_timeout_seconds: default_metadata_timeout(),
        }
    }
}

impl MarketplaceSettings {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_seconds)
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(Environment::default().separator("__"))
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 8080)?
            // Safe fallback so a bare environment still boots against devnet
            .set_default("solana_rpc.url", env::var("SOLANA_RPC_URL").unwrap_or_else(|_| "https://api.devnet.solana.com".to_string()))?
            .build()?;

        config.try_deserialize()
    }
}
