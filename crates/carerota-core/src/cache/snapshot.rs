use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::ApiError;

/// Type-erased payload held by a cache entry.
pub(crate) type AnyData = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched, or reset after logout.
    Uninitialized,
    /// First fetch in flight.
    Pending,
    Fulfilled,
    Rejected,
}

/// What a cache entry broadcasts to its subscribers on every change.
#[derive(Clone)]
pub(crate) struct EntrySnapshot {
    pub status: QueryStatus,
    pub data: Option<AnyData>,
    pub error: Option<ApiError>,
    pub is_fetching: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Default for EntrySnapshot {
    fn default() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            is_fetching: false,
            fetched_at: None,
        }
    }
}

/// Typed view of a cache entry, as a consumer renders it.
///
/// `data` is the last successful payload and survives later errors.
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<ApiError>,
    pub is_fetching: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T: Send + Sync + 'static> QueryState<T> {
    pub(crate) fn from_snapshot(snapshot: &EntrySnapshot) -> Self {
        Self {
            status: snapshot.status,
            data: snapshot
                .data
                .clone()
                .and_then(|data| data.downcast::<T>().ok()),
            error: snapshot.error.clone(),
            is_fetching: snapshot.is_fetching,
            fetched_at: snapshot.fetched_at,
        }
    }
}

impl<T> QueryState<T> {
    /// Nothing to show yet and a fetch is running.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Fulfilled
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Rejected
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.fetched_at
            .map(|fetched_at| (Utc::now() - fetched_at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                // Round up: 1d 12h+ becomes 2d
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            fetched_at: self.fetched_at,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("error", &self.error)
            .field("is_fetching", &self.is_fetching)
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}
