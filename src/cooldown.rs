//! Per-conversation action cooldowns
//!
//! This module provides the cache-based suppression window that keeps a
//! free-text trigger from firing repeatedly in the same conversation.
//! Marking is an atomic test-and-set, so duplicate webhook deliveries
//! racing on one key produce exactly one trigger.

use moka::future::Cache;
use moka::Expiry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::types::ChatId;
use tracing::debug;

/// Reads each entry's suppression window from its stored value.
struct PerEntryTtl;

impl Expiry<String, Duration> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        ttl: &Duration,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(*ttl)
    }
}

/// Cache of recently triggered (action, conversation) pairs
///
/// Each entry suppresses one action in one conversation until its window
/// elapses. Expiry is passive: an expired entry reads as absent, and the
/// next marking attempt wins again.
#[derive(Clone)]
pub struct CooldownCache {
    /// Moka cache storing cooldown key -> window mappings with per-entry TTL
    cache: Cache<String, Duration>,
    /// Counter for suppressed trigger attempts (for logging throttling)
    suppressed_count: Arc<AtomicU64>,
}

impl CooldownCache {
    /// Creates a new `CooldownCache` bounded to `max_capacity` live entries
    ///
    /// # Examples
    ///
    /// ```
    /// use banterbot::cooldown::CooldownCache;
    ///
    /// let cooldowns = CooldownCache::new(10_000);
    /// ```
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            suppressed_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attempts to mark `key` for `ttl`, claiming the trigger
    ///
    /// Returns `true` and starts the window if the key was absent or
    /// expired. Returns `false` without touching the entry if the window
    /// is still running. Concurrent callers racing on one fresh key see
    /// exactly one `true`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use banterbot::cooldown::CooldownCache;
    /// # use std::time::Duration;
    /// # async fn example() {
    /// let cooldowns = CooldownCache::new(10_000);
    ///
    /// if cooldowns.try_mark_once("ipad_1234", Duration::from_secs(900)).await {
    ///     // Run the action
    /// }
    /// # }
    /// ```
    pub async fn try_mark_once(&self, key: &str, ttl: Duration) -> bool {
        let entry = self.cache.entry(key.to_string()).or_insert(ttl).await;
        if entry.is_fresh() {
            return true;
        }

        // Window still running, increment suppressed counter
        let count = self.suppressed_count.fetch_add(1, Ordering::Relaxed) + 1;

        // Log only every 100th suppressed attempt to prevent log flooding
        if count.is_multiple_of(100) {
            debug!("Suppressed {} cooled-down triggers (recent: {})", count, key);
        }

        false
    }

    /// Returns the current number of live cooldown entries
    ///
    /// Useful for monitoring and health checks.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Returns the total number of suppressed trigger attempts
    #[must_use]
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed_count.load(Ordering::Relaxed)
    }
}

/// Composes the cache key for one action in one conversation
///
/// A missing conversation id maps to a fixed sentinel so such updates
/// still share a single window per action.
#[must_use]
pub fn cooldown_key(action: &str, conversation: Option<ChatId>) -> String {
    match conversation {
        Some(chat) => format!("{action}_{chat}"),
        None => format!("{action}_none"),
    }
}
