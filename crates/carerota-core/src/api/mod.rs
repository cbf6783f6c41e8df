//! REST API client module.
//!
//! This module provides the `ApiClient` for executing registry endpoints
//! against the remote staffing API, the response envelopes every endpoint
//! shares, and the `ApiError` taxonomy callers check before trusting a
//! payload.
//!
//! Requests carry the session's bearer token. A 401 from any endpoint ends
//! the session.

pub mod client;
pub mod envelope;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use envelope::{Ack, ApiResponse, Envelope, Paginated};
pub use error::ApiError;
pub use transport::{ApiRequest, HttpTransport, Method, RawResponse, Transport};
