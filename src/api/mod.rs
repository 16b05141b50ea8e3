pub mod handlers;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::{ApiError, AssetsResponse, FilterQuery, ListingsResponse};
