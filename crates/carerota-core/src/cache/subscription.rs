use std::fmt;

use tokio::sync::watch;

use super::snapshot::EntrySnapshot;
use super::{CacheKey, QueryCache, QueryState};
use crate::api::ApiError;
use crate::registry::{Output, Query};

/// A consumer's hold on one cached read.
///
/// The entry counts as in use for as long as the handle lives; dropping it
/// starts the entry's idle window.
pub struct Subscription<Q: Query> {
    cache: QueryCache,
    key: CacheKey,
    args: Q::Args,
    rx: watch::Receiver<EntrySnapshot>,
}

impl<Q: Query> Subscription<Q> {
    pub(crate) fn new(
        cache: QueryCache,
        key: CacheKey,
        args: Q::Args,
        rx: watch::Receiver<EntrySnapshot>,
    ) -> Self {
        Self {
            cache,
            key,
            args,
            rx,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn args(&self) -> &Q::Args {
        &self.args
    }

    pub(crate) fn snapshot(&self) -> EntrySnapshot {
        self.rx.borrow().clone()
    }

    /// Current state without waiting.
    pub fn state(&self) -> QueryState<Output<Q>> {
        QueryState::from_snapshot(&self.rx.borrow())
    }

    /// Wait for the next change. `None` once the entry is gone.
    pub async fn changed(&mut self) -> Option<QueryState<Output<Q>>> {
        self.rx.changed().await.ok()?;
        Some(QueryState::from_snapshot(&self.rx.borrow_and_update()))
    }

    /// Wait until no fetch is running and return the state at that point.
    pub async fn settled(&mut self) -> QueryState<Output<Q>> {
        loop {
            let snapshot = self.rx.borrow_and_update().clone();
            if !snapshot.is_fetching || self.rx.changed().await.is_err() {
                return QueryState::from_snapshot(&snapshot);
            }
        }
    }

    /// Re-fetch regardless of freshness.
    pub fn refetch(&self) {
        self.cache.refetch(&self.key);
    }

    /// Move the subscription to new arguments. The new key is subscribed
    /// before the old one is released, so an unchanged key never goes idle.
    pub fn set_args(&mut self, args: Q::Args) -> Result<(), ApiError> {
        *self = self.cache.subscribe::<Q>(args)?;
        Ok(())
    }
}

impl<Q: Query> Drop for Subscription<Q> {
    fn drop(&mut self) {
        self.cache.unsubscribe(&self.key);
    }
}

impl<Q: Query> fmt::Debug for Subscription<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("status", &self.rx.borrow().status)
            .finish()
    }
}
