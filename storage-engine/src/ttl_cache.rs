use crate::clock::{Clock, SystemClock};
use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL applied when a call site does not pick its own
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// A cached value together with the instant it was fetched
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Point-in-time counters for a cache instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Read-through cache keyed by caller-built strings.
///
/// Freshness is decided at read time against the TTL the caller passes, so the
/// same key can be read with different TTLs by different call sites. Expired
/// entries are dropped lazily; nothing sweeps in the background. Concurrent
/// misses on one key each run their own fetch.
pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    entries: DashMap<String, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache on the system clock with the 30 second default TTL
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self::with_clock(Arc::new(SystemClock), default_ttl)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the value cached under `key` if it is younger than `ttl`,
    /// otherwise run `fetch` once and cache what it returns.
    ///
    /// A failed fetch is returned as-is and leaves no entry behind.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F, ttl: Duration) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let now = self.clock.now();

        if let Some(value) = self.lookup(key, now, ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("cache miss: key={}", key);

        let value = fetch().await?;

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                fetched_at: now,
            },
        );

        Ok(value)
    }

    /// `get_or_fetch` with this cache's default TTL
    pub async fn get_or_fetch_default<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_fetch(key, fetch, self.default_ttl).await
    }

    /// Remove every key containing at least one of `patterns` as a substring.
    ///
    /// Returns how many entries were removed. An empty pattern matches every key.
    pub fn invalidate<I, S>(&self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<S> = patterns.into_iter().collect();
        if patterns.is_empty() {
            return 0;
        }

        let mut removed = 0;
        self.entries.retain(|key, _| {
            let matched = patterns.iter().any(|p| key.contains(p.as_ref()));
            if matched {
                removed += 1;
            }
            !matched
        });

        debug!(
            "cache invalidate: patterns={:?} removed={}",
            patterns.iter().map(|p| p.as_ref()).collect::<Vec<_>>(),
            removed
        );
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        debug!("cache cleared");
    }

    /// Whether an entry is stored under `key`, fresh or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &str, now: Instant, ttl: Duration) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, ttl) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            // Another request may have refreshed the entry since the read above.
            self.entries
                .remove_if(key, |_, entry| !entry.is_fresh(now, ttl));
        }

        None
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("TtlCache")
            .field("entries", &stats.entries)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::convert::Infallible;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Barrier;

    fn cache_with_clock() -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(clock.clone(), DEFAULT_TTL);
        (cache, clock)
    }

    async fn value(v: &str) -> Result<String, Infallible> {
        Ok(v.to_string())
    }

    async fn counted<E>(calls: &AtomicUsize, v: &str) -> Result<String, E> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(v.to_string())
    }

    async fn failing(reason: &'static str) -> Result<String, &'static str> {
        Err(reason)
    }

    async fn counted_after_barrier(
        calls: &AtomicUsize,
        barrier: &Barrier,
    ) -> Result<String, Infallible> {
        calls.fetch_add(1, Ordering::SeqCst);
        barrier.wait().await;
        Ok("v".to_string())
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_fetch() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::from_secs(30);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch("k", || counted::<Infallible>(&calls, "X"), ttl)
            .await
            .unwrap();
        assert_eq!(first, "X");

        clock.advance_secs(29);
        let second = cache
            .get_or_fetch("k", || counted::<Infallible>(&calls, "Y"), ttl)
            .await
            .unwrap();
        assert_eq!(second, "X");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refetch_at_exact_ttl_boundary() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::from_secs(30);

        cache.get_or_fetch("k", || value("old"), ttl).await.unwrap();

        clock.advance_secs(30);
        let refreshed = cache.get_or_fetch("k", || value("new"), ttl).await.unwrap();
        assert_eq!(refreshed, "new");

        // The refreshed entry starts a new TTL window
        clock.advance_secs(10);
        let again = cache.get_or_fetch("k", || value("newer"), ttl).await.unwrap();
        assert_eq!(again, "new");
    }

    #[tokio::test]
    async fn test_scenario_clients_page_ttl() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::from_secs(30);

        let x = cache
            .get_or_fetch("clients_search1_page1", || value("X"), ttl)
            .await
            .unwrap();
        assert_eq!(x, "X");

        clock.advance_secs(10);
        let still_x = cache
            .get_or_fetch("clients_search1_page1", || value("Y"), ttl)
            .await
            .unwrap();
        assert_eq!(still_x, "X");

        clock.advance_secs(21);
        let y = cache
            .get_or_fetch("clients_search1_page1", || value("Y"), ttl)
            .await
            .unwrap();
        assert_eq!(y, "Y");
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let (cache, _clock) = cache_with_clock();

        let result = cache
            .get_or_fetch("k", || failing("store unavailable"), DEFAULT_TTL)
            .await;
        assert_eq!(result, Err("store unavailable"));
        assert!(!cache.contains_key("k"));

        // The next call must go back to the fetch function
        let calls = AtomicUsize::new(0);
        let ok = cache
            .get_or_fetch("k", || counted::<&str>(&calls, "fresh"), DEFAULT_TTL)
            .await;
        assert_eq!(ok, Ok("fresh".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_after_expiry_leaves_key_absent() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::from_secs(30);

        cache.get_or_fetch("k", || value("v1"), ttl).await.unwrap();
        clock.advance_secs(31);

        let failed = cache.get_or_fetch("k", || failing("timeout"), ttl).await;
        assert!(failed.is_err());
        assert!(!cache.contains_key("k"));

        // No poisoned entry: the next call in the same window fetches again
        let calls = AtomicUsize::new(0);
        let recovered = cache
            .get_or_fetch("k", || counted::<&str>(&calls, "v2"), ttl)
            .await;
        assert_eq!(recovered, Ok("v2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_removes_only_matching_keys() {
        let (cache, _clock) = cache_with_clock();
        for key in [
            "client_42",
            "clients__1",
            "clients_bob_2",
            "dashboard_stats",
            "reservation_99",
        ] {
            cache.get_or_fetch_default(key, || value(key)).await.unwrap();
        }

        let removed = cache.invalidate(["client_42", "clients_", "dashboard_stats"]);
        assert_eq!(removed, 4);

        assert!(!cache.contains_key("client_42"));
        assert!(!cache.contains_key("clients__1"));
        assert!(!cache.contains_key("clients_bob_2"));
        assert!(!cache.contains_key("dashboard_stats"));
        assert!(cache.contains_key("reservation_99"));
    }

    #[tokio::test]
    async fn test_scenario_guest_update_invalidation() {
        let (cache, clock) = cache_with_clock();
        let ttl = Duration::from_secs(30);

        cache.get_or_fetch("client_42", || value("guest"), ttl).await.unwrap();
        cache
            .get_or_fetch("reservation_99", || value("stay"), ttl)
            .await
            .unwrap();

        clock.advance_secs(5);
        cache.invalidate(["client_42", "clients_", "dashboard_stats"]);

        let client_fetches = AtomicUsize::new(0);
        let guest = cache
            .get_or_fetch(
                "client_42",
                || counted::<Infallible>(&client_fetches, "guest v2"),
                ttl,
            )
            .await
            .unwrap();
        assert_eq!(guest, "guest v2");
        assert_eq!(client_fetches.load(Ordering::SeqCst), 1);

        let stay_fetches = AtomicUsize::new(0);
        let stay = cache
            .get_or_fetch(
                "reservation_99",
                || counted::<Infallible>(&stay_fetches, "stay v2"),
                ttl,
            )
            .await
            .unwrap();
        assert_eq!(stay, "stay");
        assert_eq!(stay_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent_and_tolerates_no_match() {
        let (cache, _clock) = cache_with_clock();
        cache.get_or_fetch_default("a_1", || value("a")).await.unwrap();
        cache.get_or_fetch_default("b_1", || value("b")).await.unwrap();

        assert_eq!(cache.invalidate(["zzz"]), 0);
        assert_eq!(cache.invalidate(["a_"]), 1);
        assert_eq!(cache.invalidate(["a_"]), 0);
        assert_eq!(cache.invalidate(Vec::<String>::new()), 0);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("b_1"));
    }

    #[tokio::test]
    async fn test_similar_keys_stay_isolated() {
        let (cache, _clock) = cache_with_clock();

        cache
            .get_or_fetch_default("clients__1", || value("all clients"))
            .await
            .unwrap();
        cache
            .get_or_fetch_default("clients_search_1", || value("search results"))
            .await
            .unwrap();

        let a = cache
            .get_or_fetch_default("clients__1", || value("wrong"))
            .await
            .unwrap();
        let b = cache
            .get_or_fetch_default("clients_search_1", || value("wrong"))
            .await
            .unwrap();
        assert_eq!(a, "all clients");
        assert_eq!(b, "search results");

        cache.invalidate(["clients_search_1"]);
        assert!(cache.contains_key("clients__1"));
        assert!(!cache.contains_key("clients_search_1"));
    }

    #[tokio::test]
    async fn test_distinct_keys_never_share_values() {
        let (cache, _clock) = cache_with_clock();
        let keys = [
            "reservation_1",
            "reservation_10",
            "reservation_1_guests",
            "Reservation_1",
        ];

        for key in keys {
            cache.get_or_fetch_default(key, || value(key)).await.unwrap();
        }
        for key in keys {
            let got = cache
                .get_or_fetch_default(key, || value("refetched"))
                .await
                .unwrap();
            assert_eq!(got, key);
        }
    }

    #[tokio::test]
    async fn test_clear_twice_leaves_cache_empty() {
        let (cache, _clock) = cache_with_clock();
        cache.get_or_fetch_default("a", || value("a")).await.unwrap();
        cache.get_or_fetch_default("b", || value("b")).await.unwrap();

        cache.clear();
        assert!(cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());

        let refetched = cache.get_or_fetch_default("a", || value("a2")).await.unwrap();
        assert_eq!(refetched, "a2");
    }

    #[tokio::test]
    async fn test_zero_ttl_always_fetches() {
        let (cache, _clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_fetch("k", || counted::<Infallible>(&calls, "v"), Duration::ZERO)
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_per_call_ttl_on_shared_key() {
        let (cache, clock) = cache_with_clock();

        cache
            .get_or_fetch("client_7", || value("v1"), Duration::from_secs(60))
            .await
            .unwrap();
        clock.advance_secs(45);

        // A 60s reader still sees the entry, a 30s reader refreshes it
        let long = cache
            .get_or_fetch("client_7", || value("v2"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(long, "v1");

        let short = cache
            .get_or_fetch("client_7", || value("v2"), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(short, "v2");
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_fetch() {
        let (cache, _clock) = cache_with_clock();
        let barrier = Barrier::new(2);
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.get_or_fetch_default("k", || counted_after_barrier(&calls, &barrier)),
            cache.get_or_fetch_default("k", || counted_after_barrier(&calls, &barrier))
        );
        assert_eq!(a.unwrap(), "v");
        assert_eq!(b.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let (cache, _clock) = cache_with_clock();

        cache.get_or_fetch_default("k", || value("v")).await.unwrap();
        cache.get_or_fetch_default("k", || value("v")).await.unwrap();
        cache.get_or_fetch_default("other", || value("v")).await.unwrap();

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 2,
                hits: 1,
                misses: 2,
            }
        );
    }
}
