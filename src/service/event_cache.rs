use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::schedule_client::ScheduleError;
use crate::models::event::Event;

pub const DEFAULT_CACHE_TTL: StdDuration = StdDuration::from_secs(300);

#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<Event>, ScheduleError>;
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub events: Vec<Event>,
    pub fetched_at: DateTime<Utc>,
}

/// Single-slot schedule cache with stale-on-error fallback.
///
/// Reads within `ttl` of the last successful fetch never touch the source.
/// A failed refresh leaves the slot untouched and serves whatever was there
/// before, or nothing. Refreshes are coalesced: while one caller is fetching,
/// callers that already have stale data get it back immediately and callers
/// with nothing cached wait for the in-flight fetch and share its outcome,
/// success or failure.
pub struct EventCache {
    source: Arc<dyn ScheduleSource>,
    ttl: Duration,
    slot: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
    attempts: AtomicU64,
}

impl EventCache {
    pub fn new(source: Arc<dyn ScheduleSource>, ttl: StdDuration) -> Self {
        // Config rejects TTLs chrono cannot represent; treat any that slip through as "never expire".
        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        Self {
            source,
            ttl,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub async fn get_events(&self) -> Vec<Event> {
        self.get_events_at(Utc::now()).await
    }

    pub async fn get_events_at(&self, now: DateTime<Utc>) -> Vec<Event> {
        let seen = self.attempts.load(Ordering::Acquire);
        if let Some(events) = self.fresh_at(now) {
            debug!("schedule cache hit");
            return events;
        }

        let _guard = match self.refresh.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(entry) = self.entry() {
                    debug!("refresh in flight, serving stale schedule");
                    return entry.events;
                }
                self.refresh.lock().await
            }
        };
        if self.attempts.load(Ordering::Acquire) != seen {
            debug!("joined finished refresh attempt");
            return self.current_or_empty();
        }

        let outcome = self.source.fetch_events().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);
        match outcome {
            Ok(events) => {
                info!(count = events.len(), "refreshed schedule cache");
                self.store(events.clone(), now);
                events
            }
            Err(err) => {
                warn!(error = %err, "schedule refresh failed, serving cached data");
                self.current_or_empty()
            }
        }
    }

    pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry().map(|entry| entry.fetched_at)
    }

    pub fn entry(&self) -> Option<CacheEntry> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.clone()
    }

    /// Number of upstream fetches attempted so far, failed ones included.
    pub fn refresh_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    fn current_or_empty(&self) -> Vec<Event> {
        self.entry().map(|entry| entry.events).unwrap_or_default()
    }

    fn fresh_at(&self, now: DateTime<Utc>) -> Option<Vec<Event>> {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_ref()
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.events.clone())
    }

    fn store(&self, events: Vec<Event>, now: DateTime<Utc>) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let fetched_at = match slot.as_ref() {
            Some(previous) if previous.fetched_at > now => previous.fetched_at,
            _ => now,
        };
        *slot = Some(CacheEntry { events, fetched_at });
    }
}
