use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::snapshot::{AnyData, EntrySnapshot};
use super::{CacheKey, QueryStatus, Subscription};
use crate::api::{ApiClient, ApiError};
use crate::registry::{Mutation, Output, Query, Tag};

/// How long an entry nobody subscribes to is kept before eviction.
/// Short enough that leaving a view frees its data, long enough that
/// navigating back and forth reuses it.
pub const DEFAULT_KEEP_UNUSED_FOR_SECS: u64 = 60;

type FetchOutcome = Result<AnyData, ApiError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;
type Fetcher = Arc<dyn Fn(ApiClient) -> BoxFuture<'static, FetchOutcome> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// `None` keeps unused entries forever.
    pub keep_unused_for: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            keep_unused_for: Some(Duration::from_secs(DEFAULT_KEEP_UNUSED_FOR_SECS)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub subscribed: usize,
    pub in_flight: usize,
}

struct Entry {
    provides: &'static [Tag],
    fetcher: Fetcher,
    snapshot: watch::Sender<EntrySnapshot>,
    subscribers: usize,
    stale: bool,
    /// Requests with an id at or below this predate the entry.
    created_after: u64,
    last_issued: u64,
    last_applied: u64,
    in_flight: Option<SharedFetch>,
    idle_since: Option<Instant>,
}

impl Entry {
    fn new(provides: &'static [Tag], fetcher: Fetcher, created_after: u64) -> Self {
        let (snapshot, _rx) = watch::channel(EntrySnapshot::default());
        Self {
            provides,
            fetcher,
            snapshot,
            subscribers: 0,
            stale: false,
            created_after,
            last_issued: created_after,
            last_applied: created_after,
            in_flight: None,
            idle_since: None,
        }
    }

    fn needs_fetch(&self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.stale
            || matches!(
                self.snapshot.borrow().status,
                QueryStatus::Uninitialized | QueryStatus::Rejected
            )
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    tags: HashMap<Tag, HashSet<CacheKey>>,
}

impl CacheState {
    fn remove_entry(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            for tag in entry.provides {
                if let Some(keys) = self.tags.get_mut(tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.tags.remove(tag);
                    }
                }
            }
        }
    }
}

struct CacheInner {
    client: ApiClient,
    config: CacheConfig,
    request_ids: AtomicU64,
    state: Mutex<CacheState>,
}

/// Process-wide query cache.
/// Clone is cheap - clones share the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

fn fetcher_for<Q: Query>(args: Q::Args) -> Fetcher {
    Arc::new(move |client: ApiClient| {
        let args = args.clone();
        async move {
            client
                .execute::<Q>(&args)
                .await
                .map(|output| Arc::new(output) as AnyData)
        }
        .boxed()
    })
}

fn downcast<T: Send + Sync + 'static>(key: &CacheKey, data: AnyData) -> Result<Arc<T>, ApiError> {
    data.downcast::<T>()
        .map_err(|_| ApiError::InvalidResponse(format!("{} holds an unexpected type", key)))
}

impl QueryCache {
    /// Create a cache reading through `client`. The cache follows the
    /// client's session: whenever the token changes everything cached is
    /// dropped, and once signed in again subscribed reads are re-fetched
    /// with the new credentials.
    pub fn new(client: ApiClient, config: CacheConfig) -> Self {
        let cache = Self {
            inner: Arc::new(CacheInner {
                client,
                config,
                request_ids: AtomicU64::new(0),
                state: Mutex::new(CacheState::default()),
            }),
        };
        let weak = Arc::downgrade(&cache.inner);
        cache.inner.client.session().on_credentials_changed(move |session| {
            if let Some(inner) = weak.upgrade() {
                QueryCache { inner }.credentials_changed(session.is_authenticated());
            }
        });
        cache
    }

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn config(&self) -> CacheConfig {
        self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to a read. Fetches when there is no usable entry yet; a fetch
    /// already in flight for the same key is shared instead.
    pub fn subscribe<Q: Query>(&self, args: Q::Args) -> Result<Subscription<Q>, ApiError> {
        let key = CacheKey::new::<Q>(&args)?;
        let mut state = self.lock();
        let created_after = self.inner.request_ids.load(Ordering::SeqCst);

        let CacheState { entries, tags } = &mut *state;
        let entry = entries.entry(key.clone()).or_insert_with(|| {
            for tag in Q::PROVIDES {
                tags.entry(*tag).or_default().insert(key.clone());
            }
            Entry::new(Q::PROVIDES, fetcher_for::<Q>(args.clone()), created_after)
        });

        if entry.stale && entry.subscribers == 0 && entry.in_flight.is_none() {
            // Invalidated while nobody watched: the old data is not worth showing
            entry.snapshot.send_replace(EntrySnapshot::default());
        }
        entry.subscribers += 1;
        entry.idle_since = None;
        let receiver = entry.snapshot.subscribe();
        let needs_fetch = entry.needs_fetch();
        debug!(key = %key, subscribers = entry.subscribers, needs_fetch, "Subscribed");

        if needs_fetch {
            self.start_fetch(&mut state, &key);
        }
        drop(state);

        Ok(Subscription::new(self.clone(), key, args, receiver))
    }

    pub(crate) fn unsubscribe(&self, key: &CacheKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                entry.idle_since = Some(Instant::now());
            }
            debug!(key = %key, subscribers = entry.subscribers, "Unsubscribed");
        }
    }

    /// Fetch once, sharing any cached or in-flight result, and release the
    /// entry again.
    pub async fn query<Q: Query>(&self, args: Q::Args) -> Result<Arc<Output<Q>>, ApiError> {
        let subscription = self.subscribe::<Q>(args)?;
        let pending = self.in_flight(subscription.key());

        let data = match pending {
            Some(fetch) => fetch.await?,
            None => {
                let snapshot = subscription.snapshot();
                match (snapshot.data, snapshot.error) {
                    (_, Some(error)) => return Err(error),
                    (Some(data), None) => data,
                    (None, None) => {
                        return Err(ApiError::InvalidResponse(format!(
                            "{} has no data",
                            subscription.key()
                        )))
                    }
                }
            }
        };

        downcast::<Output<Q>>(subscription.key(), data)
    }

    /// Execute a write and, on success only, invalidate the tags it declares.
    pub async fn mutate<M: Mutation>(&self, args: &M::Args) -> Result<Output<M>, ApiError> {
        let output = self.inner.client.execute::<M>(args).await?;
        if !M::INVALIDATES.is_empty() {
            let refetched = self.invalidate(M::INVALIDATES);
            debug!(endpoint = M::NAME, tags = ?M::INVALIDATES, refetched, "Mutation invalidated tags");
        }
        Ok(output)
    }

    /// Mark every entry providing any of `tags` stale and re-fetch the ones
    /// with subscribers. Returns the number of fetches started.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut state = self.lock();
        let keys: HashSet<CacheKey> = tags
            .iter()
            .filter_map(|tag| state.tags.get(tag))
            .flatten()
            .cloned()
            .collect();

        let mut refetched = 0;
        for key in keys {
            let active = match state.entries.get_mut(&key) {
                Some(entry) => {
                    entry.stale = true;
                    if entry.subscribers == 0 {
                        // Whatever is in flight predates the write and must not land
                        entry.in_flight = None;
                        entry.last_applied = entry.last_issued;
                        entry.snapshot.send_modify(|snapshot| snapshot.is_fetching = false);
                    }
                    entry.subscribers > 0
                }
                None => continue,
            };
            if active && self.start_fetch(&mut state, &key).is_some() {
                refetched += 1;
            }
        }
        refetched
    }

    /// Start a new fetch for `key`, superseding any in flight.
    pub(crate) fn refetch(&self, key: &CacheKey) {
        let mut state = self.lock();
        self.start_fetch(&mut state, key);
    }

    fn in_flight(&self, key: &CacheKey) -> Option<SharedFetch> {
        self.lock()
            .entries
            .get(key)
            .and_then(|entry| entry.in_flight.clone())
    }

    fn start_fetch(&self, state: &mut CacheState, key: &CacheKey) -> Option<SharedFetch> {
        let entry = state.entries.get_mut(key)?;
        let request_id = self.inner.request_ids.fetch_add(1, Ordering::SeqCst) + 1;
        entry.last_issued = request_id;
        entry.stale = false;

        let fetch = (entry.fetcher)(self.inner.client.clone()).shared();
        entry.in_flight = Some(fetch.clone());
        entry.snapshot.send_modify(|snapshot| {
            snapshot.is_fetching = true;
            if snapshot.status == QueryStatus::Uninitialized {
                snapshot.status = QueryStatus::Pending;
            }
        });
        debug!(key = %key, request_id, "Fetch started");

        let cache = self.clone();
        let settle_key = key.clone();
        let settle = fetch.clone();
        tokio::spawn(async move {
            let outcome = settle.await;
            cache.settle(&settle_key, request_id, outcome);
        });

        Some(fetch)
    }

    /// Apply a finished fetch unless a newer one has already landed.
    fn settle(&self, key: &CacheKey, request_id: u64, outcome: FetchOutcome) {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            debug!(key = %key, request_id, "Entry gone before fetch settled");
            return;
        };
        if request_id <= entry.created_after || request_id <= entry.last_applied {
            debug!(key = %key, request_id, last_applied = entry.last_applied, "Discarding superseded response");
            return;
        }

        entry.last_applied = request_id;
        let still_fetching = entry.last_issued > request_id;
        if !still_fetching {
            entry.in_flight = None;
        }

        entry.snapshot.send_modify(|snapshot| {
            snapshot.is_fetching = still_fetching;
            match outcome {
                Ok(data) => {
                    snapshot.status = QueryStatus::Fulfilled;
                    snapshot.data = Some(data);
                    snapshot.error = None;
                    snapshot.fetched_at = Some(Utc::now());
                }
                Err(error) => {
                    debug!(key = %key, error = %error, "Fetch failed");
                    snapshot.status = QueryStatus::Rejected;
                    snapshot.error = Some(error);
                }
            }
        });
    }

    /// Evict entries without subscribers that have been idle for
    /// `keep_unused_for`. Returns how many were evicted.
    pub fn sweep_idle(&self) -> usize {
        let Some(keep_unused_for) = self.inner.config.keep_unused_for else {
            return 0;
        };
        let now = Instant::now();
        let mut state = self.lock();
        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers == 0
                    && entry.in_flight.is_none()
                    && entry
                        .idle_since
                        .is_some_and(|since| now.duration_since(since) >= keep_unused_for)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove_entry(key);
        }
        if !expired.is_empty() {
            debug!(evicted = expired.len(), remaining = state.entries.len(), "Evicted idle entries");
        }
        expired.len()
    }

    /// Run `sweep_idle` every `period` until the cache is dropped.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                QueryCache { inner }.sweep_idle();
            }
        })
    }

    /// Forget all cached data, e.g. on logout. Results of fetches still in
    /// flight are ignored; subscribed entries stay registered but empty.
    pub fn reset(&self) {
        let mut state = self.lock();
        let floor = self.inner.request_ids.load(Ordering::SeqCst);

        let unused: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.subscribers == 0)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &unused {
            state.remove_entry(key);
        }

        for entry in state.entries.values_mut() {
            entry.created_after = floor;
            entry.last_issued = floor;
            entry.last_applied = floor;
            entry.in_flight = None;
            entry.stale = true;
            entry.snapshot.send_replace(EntrySnapshot::default());
        }
        info!(kept = state.entries.len(), dropped = unused.len(), "Query cache reset");
    }

    /// Drop data fetched under the previous credentials; with new ones,
    /// re-fetch what is still subscribed.
    fn credentials_changed(&self, authenticated: bool) {
        self.reset();
        if !authenticated {
            return;
        }
        let mut state = self.lock();
        let subscribed: Vec<CacheKey> = state.entries.keys().cloned().collect();
        for key in &subscribed {
            self.start_fetch(&mut state, key);
        }
        if !subscribed.is_empty() {
            debug!(refetched = subscribed.len(), "Re-fetching subscribed reads for new session");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            subscribed: state.entries.values().filter(|e| e.subscribers > 0).count(),
            in_flight: state.entries.values().filter(|e| e.in_flight.is_some()).count(),
        }
    }

    /// Subscriber count of `key`, if it is cached.
    pub fn subscribers(&self, key: &CacheKey) -> Option<usize> {
        self.lock().entries.get(key).map(|entry| entry.subscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::auth::GetProfile;
    use crate::registry::organization::GetCurrentOrganization;
    use crate::registry::shifts::{CreateShift, ListShifts, ListShiftsArgs, NewShift};
    use crate::registry::staff::{ListStaff, ListStaffArgs, RemoveStaff};
    use crate::auth::SessionAction;
    use crate::testing::{
        ok_json, organization_json, shift_json, test_client, MockTransport,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn week(start_day: u32) -> ListShiftsArgs {
        ListShiftsArgs {
            from: date(2026, 3, start_day),
            to: date(2026, 3, start_day + 6),
        }
    }

    fn cache_with(transport: Arc<MockTransport>, config: CacheConfig) -> QueryCache {
        let (client, _session) = test_client(transport);
        QueryCache::new(client, config)
    }

    /// Answers every endpoint the tests touch. Shift lists grow by one
    /// shift per call so re-fetches are observable.
    fn api(delay: Duration) -> Arc<MockTransport> {
        MockTransport::with_delay(move |req, n| {
            let path = req.url.trim_start_matches("https://api.test");
            let body = match path {
                "/organizations/current" => ok_json(&organization_json("org-1", "Meadow View")),
                "/shifts" if req.method == crate::api::Method::Get => {
                    let shifts: Vec<String> =
                        (0..=n).map(|i| shift_json(&format!("s{i}"), 2)).collect();
                    ok_json(&format!("[{}]", shifts.join(",")))
                }
                "/shifts" => ok_json(&shift_json("new", 1)),
                "/staff" => r#"{"data":[],"pagination":{"total":0,"page":1,"limit":20,"totalPages":0}}"#
                    .to_string(),
                _ => r#"{"success":true}"#.to_string(),
            };
            (delay, 200, body)
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_subscribers_share_one_request() {
        let transport = api(Duration::from_millis(50));
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut first = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        let mut second = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        let (a, b) = tokio::join!(
            cache.query::<GetCurrentOrganization>(()),
            cache.query::<GetCurrentOrganization>(())
        );

        assert_eq!(a.expect("query a").name, "Meadow View");
        assert_eq!(b.expect("query b").name, "Meadow View");
        let first_state = first.settled().await;
        let second_state = second.settled().await;
        assert_eq!(first_state.data.map(|org| org.id.clone()), Some("org-1".to_string()));
        assert!(second_state.is_success());
        assert_eq!(transport.count("/organizations/current"), 1);
    }

    #[tokio::test]
    async fn test_cached_read_is_reused() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        subscription.settled().await;
        cache
            .query::<GetCurrentOrganization>(())
            .await
            .expect("cached query");
        assert_eq!(transport.count("/organizations/current"), 1);
    }

    #[tokio::test]
    async fn test_mutation_refetches_active_reads_providing_its_tags() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut shifts = cache.subscribe::<ListShifts>(week(2)).expect("subscribe");
        let mut staff = cache
            .subscribe::<ListStaff>(ListStaffArgs::default())
            .expect("subscribe");
        assert_eq!(shifts.settled().await.data.map(|s| s.len()), Some(1));
        staff.settled().await;

        let created = cache
            .mutate::<CreateShift>(&NewShift {
                date: date(2026, 3, 3),
                pattern_id: "p1".to_string(),
                count: 1,
            })
            .await
            .expect("create shift");
        assert_eq!(created.id, "new");

        let state = shifts.settled().await;
        assert_eq!(state.data.map(|s| s.len()), Some(2));
        // 2 list reads plus the create
        assert_eq!(transport.count("/shifts"), 3);
        assert_eq!(transport.count("/staff"), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_invalidate() {
        let transport = MockTransport::new(|req, _n| match req.method {
            crate::api::Method::Delete => (403, r#"{"message":"Managers only"}"#.to_string()),
            _ => (
                200,
                r#"{"data":[],"pagination":{"total":0,"page":1,"limit":20,"totalPages":0}}"#
                    .to_string(),
            ),
        });
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut staff = cache
            .subscribe::<ListStaff>(ListStaffArgs::default())
            .expect("subscribe");
        staff.settled().await;

        let err = cache
            .mutate::<RemoveStaff>(&"u1".to_string())
            .await
            .expect_err("forbidden");
        assert_eq!(err, ApiError::AccessDenied("Managers only".to_string()));
        assert_eq!(cache.stats().in_flight, 0);
        assert_eq!(transport.count("/staff"), 1);
    }

    #[tokio::test]
    async fn test_invalidated_entry_without_subscribers_refetches_on_next_access() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport.clone(), CacheConfig::default());

        cache.query::<ListShifts>(week(2)).await.expect("first read");
        assert_eq!(cache.invalidate(&[Tag::Shifts]), 0);
        assert_eq!(transport.count("/shifts"), 1);

        let shifts = cache.query::<ListShifts>(week(2)).await.expect("second read");
        assert_eq!(shifts.len(), 2);
        assert_eq!(transport.count("/shifts"), 2);
    }

    /// First response is slow and carries the old name.
    fn renamed_after_first_read() -> Arc<MockTransport> {
        MockTransport::with_delay(|_req, n| {
            let (delay, name) = if n == 0 {
                (Duration::from_millis(100), "Old Name")
            } else {
                (Duration::from_millis(10), "New Name")
            };
            (delay, 200, ok_json(&organization_json("org-1", name)))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_outliving_its_subscriber_is_dropped_once_invalidated() {
        let transport = renamed_after_first_read();
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        drop(subscription);
        assert_eq!(cache.stats().in_flight, 1, "unsubscribing does not cancel the request");

        assert_eq!(cache.invalidate(&[Tag::Organization]), 0);
        assert_eq!(cache.stats().in_flight, 0);

        // The old response arrives while nobody is watching
        tokio::time::sleep(Duration::from_millis(200)).await;

        let mut again = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        let state = again.state();
        assert!(state.data.is_none());
        assert_eq!(state.status, QueryStatus::Pending);

        let state = again.settled().await;
        assert_eq!(state.status, QueryStatus::Fulfilled);
        assert_eq!(state.data.map(|org| org.name.clone()), Some("New Name".to_string()));
        assert_eq!(transport.count("/organizations/current"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_invalidated_while_unwatched_is_not_shown_again() {
        let transport = renamed_after_first_read();
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let first = cache
            .query::<GetCurrentOrganization>(())
            .await
            .expect("first read");
        assert_eq!(first.name, "Old Name");
        cache.invalidate(&[Tag::Organization]);

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        let state = subscription.state();
        assert!(state.data.is_none());
        assert!(state.is_fetching);

        let state = subscription.settled().await;
        assert_eq!(state.data.map(|org| org.name.clone()), Some("New Name".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_does_not_overwrite_newer_one() {
        // First request is slow and returns the old name, the second is fast
        let transport = MockTransport::with_delay(|_req, n| {
            let (delay, name) = if n == 0 {
                (Duration::from_millis(100), "Old Name")
            } else {
                (Duration::from_millis(10), "New Name")
            };
            (delay, 200, ok_json(&organization_json("org-1", name)))
        });
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        assert_eq!(cache.invalidate(&[Tag::Organization]), 1);

        let state = subscription.settled().await;
        assert_eq!(state.data.map(|org| org.name.clone()), Some("New Name".to_string()));

        // Let the slow first response arrive
        tokio::time::sleep(Duration::from_millis(200)).await;
        let state = subscription.state();
        assert_eq!(state.data.map(|org| org.name.clone()), Some("New Name".to_string()));
        assert!(!state.is_fetching);
        assert_eq!(transport.count("/organizations/current"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_response_landing_first_is_replaced() {
        let transport = MockTransport::with_delay(|_req, n| {
            let (delay, name) = if n == 0 {
                (Duration::from_millis(10), "Old Name")
            } else {
                (Duration::from_millis(100), "New Name")
            };
            (delay, 200, ok_json(&organization_json("org-1", name)))
        });
        let cache = cache_with(transport, CacheConfig::default());

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        cache.invalidate(&[Tag::Organization]);

        let interim = subscription.changed().await.expect("entry alive");
        assert!(interim.is_fetching, "newer request is still running");

        let state = subscription.settled().await;
        assert_eq!(state.data.map(|org| org.name.clone()), Some("New Name".to_string()));
    }

    #[tokio::test]
    async fn test_error_keeps_last_good_data() {
        let transport = MockTransport::new(|_req, n| {
            if n == 0 {
                (200, ok_json(&organization_json("org-1", "Meadow View")))
            } else {
                (500, r#"{"message":"database unavailable"}"#.to_string())
            }
        });
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        subscription.settled().await;
        subscription.refetch();

        let state = subscription.settled().await;
        assert!(state.is_error());
        assert_eq!(
            state.error,
            Some(ApiError::ServerError("database unavailable".to_string()))
        );
        assert_eq!(state.data.map(|org| org.name.clone()), Some("Meadow View".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_entry_refetches_for_new_subscriber() {
        let transport = MockTransport::new(|_req, n| {
            if n == 0 {
                (503, "maintenance".to_string())
            } else {
                (200, ok_json(&organization_json("org-1", "Meadow View")))
            }
        });
        let cache = cache_with(transport.clone(), CacheConfig::default());

        let mut first = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        assert!(first.settled().await.is_error());

        let org = cache
            .query::<GetCurrentOrganization>(())
            .await
            .expect("second attempt");
        assert_eq!(org.name, "Meadow View");
        assert_eq!(transport.count("/organizations/current"), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_read_ends_session() {
        let transport = MockTransport::new(|_req, _n| (401, String::new()));
        let (client, session) = test_client(transport);
        session.dispatch(SessionAction::CredentialsSet {
            token: "t".to_string(),
            user: None,
        });
        let cache = QueryCache::new(client, CacheConfig::default());

        let err = cache.query::<GetProfile>(()).await.expect_err("unauthorized");
        assert!(err.is_unauthorized());
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unused_entries_are_evicted_after_idle_window() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport, CacheConfig::default());

        let mut kept = cache.subscribe::<ListShifts>(week(2)).expect("subscribe");
        let mut released = cache.subscribe::<ListShifts>(week(9)).expect("subscribe");
        kept.settled().await;
        released.settled().await;
        drop(released);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.sweep_idle(), 0, "idle window has not passed");
        tokio::time::advance(Duration::from_secs(DEFAULT_KEEP_UNUSED_FOR_SECS + 1)).await;
        assert_eq!(cache.sweep_idle(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.subscribers(kept.key()), Some(1));

        // The evicted key no longer answers to its tag
        assert_eq!(cache.invalidate(&[Tag::Shifts]), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubscribing_cancels_eviction() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport, CacheConfig::default());

        let mut subscription = cache.subscribe::<ListShifts>(week(2)).expect("subscribe");
        subscription.settled().await;
        drop(subscription);

        tokio::time::advance(Duration::from_secs(30)).await;
        let _again = cache.subscribe::<ListShifts>(week(2)).expect("subscribe");
        tokio::time::advance(Duration::from_secs(DEFAULT_KEEP_UNUSED_FOR_SECS)).await;
        assert_eq!(cache.sweep_idle(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_can_be_disabled() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(
            transport,
            CacheConfig {
                keep_unused_for: None,
            },
        );

        cache.query::<ListShifts>(week(2)).await.expect("read");
        tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
        assert_eq!(cache.sweep_idle(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport, CacheConfig::default());
        let sweeper = cache.spawn_sweeper(Duration::from_secs(10));

        cache.query::<ListShifts>(week(2)).await.expect("read");
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_secs(DEFAULT_KEEP_UNUSED_FOR_SECS + 15)).await;
        assert!(cache.is_empty());
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_reset_clears_data_and_unused_entries() {
        let transport = api(Duration::ZERO);
        let cache = cache_with(transport, CacheConfig::default());

        let mut subscription = cache.subscribe::<GetCurrentOrganization>(()).expect("subscribe");
        subscription.settled().await;
        cache.query::<ListShifts>(week(2)).await.expect("read");
        assert_eq!(cache.len(), 2);

        cache.reset();
        assert_eq!(cache.len(), 1);
        let state = subscription.state();
        assert_eq!(state.status, QueryStatus::Uninitialized);
        assert!(state.data.is_none());
    }
}
