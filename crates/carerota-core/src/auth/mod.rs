//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `SessionState` and the pure `reduce` function over `SessionAction`s
//! - `SessionStore`: shared, injectable holder of the current state
//! - `TokenStore`: persistence of the session across restarts, on disk or
//!   in the OS keychain
//!
//! A session ends on explicit logout or on any 401 from the API.

pub mod session;
pub mod token_store;

pub use session::{reduce, SessionAction, SessionState, SessionStore};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};
