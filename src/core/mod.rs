//! Core types - pure abstractions shared across the codebase.

mod category;
mod state;

pub use category::AssetCategory;
pub use state::{is_shutdown, register_server, register_shutdown, setup_shutdown_handler};
