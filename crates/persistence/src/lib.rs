//! Coindeck Persistence - Client state storage and price cache

pub mod cache;
pub mod store;

pub use cache::PriceCache;
pub use store::StateStore;
