pub mod settings;
pub mod validation;

pub use settings::{
    Settings,
    ApplicationSettings,
    SolanaRpcSettings,
    MarketplaceSettings,
};
pub use validation::validate_settings;
