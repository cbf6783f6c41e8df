//! Carerota Core Library
//!
//! Client-side data layer for the care staffing platform: a typed registry
//! of every remote operation, a tag-indexed query cache with subscription
//! handles for views, and the signed-in session.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod models;
pub mod registry;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at crate root
pub use api::{ApiClient, ApiError, HttpTransport, Transport};
pub use auth::{SessionAction, SessionState, SessionStore};
pub use cache::{CacheConfig, QueryCache, QueryState, QueryStatus, Subscription};
pub use config::Config;
pub use context::AppContext;
pub use registry::{Endpoint, Mutation, Query, Tag};
