pub mod clean;
pub mod client;
pub mod config;
pub mod harvest;
pub mod model;
pub mod traits;

// Re-export common types for convenience
pub use client::*;
pub use config::*;
pub use model::*;
pub use traits::*;
