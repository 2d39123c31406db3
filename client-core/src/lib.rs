//! client-core: Shared infrastructure for the docqa client crates.
pub mod config;
pub mod error;
pub mod observability;

pub use error::AppError;

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use validator;
