//! Legisync Upstream Client
//!
//! Rate-limited, retrying HTTP client for the congressional data API, plus
//! the remote payload models and the `PageSource` seam the engine fetches
//! pages through.

pub mod congress;
pub mod limiter;
pub mod records;
pub mod source;

pub use congress::CongressClient;
pub use limiter::RateLimiter;
pub use source::{ApiPage, PageSource, ResourceDescriptor, ResourceType};
