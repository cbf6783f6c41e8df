//! Tag-indexed query cache.
//!
//! This module provides the `QueryCache` that sits between views and the
//! API client:
//!
//! - reads are cached per (endpoint, serialized args) key and shared by all
//!   subscribers of that key, with at most one fetch in flight
//! - writes invalidate the tags they declare, re-fetching every subscribed
//!   read that provides one of them
//! - `Subscription` binds a consumer's lifetime to a key (subscribe on
//!   creation, unsubscribe on drop)
//! - entries nobody has watched for `keep_unused_for` are evicted by
//!   `sweep_idle`

pub mod key;
pub mod snapshot;
pub mod store;
pub mod subscription;

pub use key::CacheKey;
pub use snapshot::{QueryState, QueryStatus};
pub use store::{CacheConfig, CacheStats, QueryCache, DEFAULT_KEEP_UNUSED_FOR_SECS};
pub use subscription::Subscription;
