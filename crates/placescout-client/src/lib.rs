pub mod config;
pub mod fetcher;
pub mod places;

pub use config::PlacesConfig;
pub use fetcher::ReqwestPageFetcher;
pub use places::{GooglePlacesClient, KeyCheck};
