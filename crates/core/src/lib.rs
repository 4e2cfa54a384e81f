//! Coindeck Core - Shared data models, view model, and errors

pub mod errors;
pub mod favorites;
pub mod models;
pub mod portfolio;
pub mod view;

pub use errors::{Error, Result};
pub use favorites::FavoriteSet;
pub use models::*;
pub use portfolio::{Portfolio, PortfolioEntry, PortfolioValuation, ValuedEntry};
pub use view::{visible_rows, SortDirection, SortKey, Tab, ViewState};
