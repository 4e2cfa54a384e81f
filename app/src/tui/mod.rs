//! Terminal UI: key mapping and rendering

pub mod input;
pub mod render;

pub use input::{map_key, Action};
pub use render::render;
