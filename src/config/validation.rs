use anyhow::{Result, anyhow};
use url::Url;

use crate::config::Settings;
use crate::solana_rpc::Pubkey;

pub fn validate_settings(settings: &Settings) -> Result<()> {
    Url::parse(&settings.solana_rpc.url)
        .map_err(|e| anyhow!("solana_rpc.url ({}) is not a valid URL: {}", settings.solana_rpc.url, e))?;

    settings.marketplace.program_id.parse::<Pubkey>()
        .map_err(|e| anyhow!("marketplace.program_id is not a valid public key: {}", e))?;

    if settings.marketplace.hydration_concurrency == 0 {
        return Err(anyhow!("marketplace.hydration_concurrency must be at least 1"));
    }

    if settings.marketplace.price_divisor == 0 {
        return Err(anyhow!("marketplace.price_divisor must be at least 1"));
    }

    if settings.marketplace.listing_data_size < 8 {
        return Err(anyhow!(
            "marketplace.listing_data_size ({}) cannot hold an account discriminator",
            settings.marketplace.listing_data_size
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApplicationSettings, MarketplaceSettings, SolanaRpcSettings};

    fn settings() -> Settings {
        Settings {
            application: ApplicationSettings {
                port: 8080,
                host: "0.0.0.0".to_string(),
                cors_allow_origin: "*".to_string(),
                cors_allow_methods: "GET".to_string(),
                cors_allow_headers: "Content-Type".to_string(),
            },
            solana_rpc: SolanaRpcSettings {
                url: "http://localhost:8899".to_string(),
                commitment: "confirmed".to_string(),
                request_timeout_seconds: 5,
            },
            marketplace: MarketplaceSettings::default(),
        }
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate_settings(&settings()).is_ok());
    }

    #[test]
    fn rejects_bad_rpc_url() {
        let mut s = settings();
        s.solana_rpc.url = "not a url".to_string();
        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn rejects_bad_program_id() {
        let mut s = settings();
        s.marketplace.program_id = "0OIl".to_string();
        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn rejects_zero_concurrency_and_divisor() {
        let mut s = settings();
        s.marketplace.hydration_concurrency = 0;
        assert!(validate_settings(&s).is_err());

        let mut s = settings();
        s.marketplace.price_divisor = 0;
        assert!(validate_settings(&s).is_err());
    }
}
