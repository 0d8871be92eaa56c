//! Time-bounded cache of the last decoded status snapshot.
//!
//! A snapshot is served from the cache while it is younger than the TTL
//! (strictly: `now - captured_at < ttl`). A zero TTL disables caching
//! entirely: nothing is stored and nothing is served.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// A snapshot together with the instant it was captured.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub snapshot: Arc<T>,
    pub captured_at: Instant,
}

// Manual impl: `Arc<T>` is `Clone` regardless of `T`.
impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        CacheEntry {
            snapshot: Arc::clone(&self.snapshot),
            captured_at: self.captured_at,
        }
    }
}

#[derive(Debug)]
pub struct StatusCache<T> {
    ttl: Duration,
    entry: Option<CacheEntry<T>>,
}

impl<T> StatusCache<T> {
    pub fn new(ttl: Duration) -> Self {
        StatusCache { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Change the TTL. Setting it to zero also drops the current entry.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
        if ttl.is_zero() {
            self.entry = None;
        }
    }

    /// The cached snapshot, if one exists and is still within the TTL at
    /// `now`.
    pub fn fresh(&self, now: Instant) -> Option<Arc<T>> {
        let entry = self.entry.as_ref()?;
        (now.saturating_duration_since(entry.captured_at) < self.ttl)
            .then(|| Arc::clone(&entry.snapshot))
    }

    /// Replace the entry wholesale. A no-op while caching is disabled.
    pub fn store(&mut self, snapshot: Arc<T>, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }
        self.entry = Some(CacheEntry {
            snapshot,
            captured_at: now,
        });
    }

    /// The current entry regardless of age.
    pub fn entry(&self) -> Option<&CacheEntry<T>> {
        self.entry.as_ref()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn hit_within_ttl_miss_at_ttl() {
        let mut cache = StatusCache::new(Duration::from_millis(40));
        let t0 = Instant::now();
        cache.store(Arc::new(7u8), t0);

        assert_eq!(cache.fresh(t0).as_deref(), Some(&7));
        assert_eq!(
            cache.fresh(t0 + Duration::from_millis(39)).as_deref(),
            Some(&7)
        );
        assert!(cache.fresh(t0 + Duration::from_millis(40)).is_none());
        assert!(cache.fresh(t0 + Duration::from_secs(5)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_never_returns_after_expiry() {
        let mut cache = StatusCache::new(Duration::from_millis(40));
        let t0 = Instant::now();
        cache.store(Arc::new("a"), t0);

        let mut expired = false;
        for step in 0..20u64 {
            let hit = cache.fresh(t0 + Duration::from_millis(step * 5)).is_some();
            if expired {
                assert!(!hit, "hit at {} ms after expiry", step * 5);
            }
            expired |= !hit;
        }
        assert!(expired);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_disables_caching() {
        let mut cache = StatusCache::new(Duration::ZERO);
        let now = Instant::now();
        cache.store(Arc::new(1u8), now);
        assert!(cache.entry().is_none());
        assert!(cache.fresh(now).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn setting_zero_ttl_drops_entry() {
        let mut cache = StatusCache::new(Duration::from_millis(40));
        let now = Instant::now();
        cache.store(Arc::new(1u8), now);
        cache.set_ttl(Duration::ZERO);
        assert!(cache.entry().is_none());

        cache.set_ttl(Duration::from_millis(100));
        cache.store(Arc::new(2u8), now);
        assert_eq!(cache.fresh(now + Duration::from_millis(60)).as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_forgets_snapshot() {
        let mut cache = StatusCache::new(Duration::from_secs(1));
        let now = Instant::now();
        cache.store(Arc::new(1u8), now);
        cache.clear();
        assert!(cache.fresh(now).is_none());
    }
}
