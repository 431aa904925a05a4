//! engine::context
//!
//! Per-run state shared by the concurrent stages of one generation.
//!
//! # Design
//!
//! Nothing here is global. A [`RunContext`] is created at the start of a
//! run and dropped at its end; it owns the tag time cache, the run-start
//! instant used for the unreleased boundary, and the event counter.
//!
//! The cache lock is never held across an `.await`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::resolver::TagTimeCache;

/// Default bound on in-flight forge requests.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 25;

/// State owned by one generation run.
#[derive(Debug)]
pub struct RunContext {
    started_at: DateTime<Utc>,
    max_concurrent_requests: usize,
    tag_times: Mutex<TagTimeCache>,
    events_fetched: AtomicUsize,
}

impl RunContext {
    /// Start a run now.
    pub fn new(max_concurrent_requests: usize) -> Self {
        Self::started_at(Utc::now(), max_concurrent_requests)
    }

    /// Start a run at a fixed instant (tests pin the unreleased boundary).
    pub fn started_at(at: DateTime<Utc>, max_concurrent_requests: usize) -> Self {
        Self {
            started_at: at,
            max_concurrent_requests: max_concurrent_requests.max(1),
            tag_times: Mutex::new(TagTimeCache::new()),
            events_fetched: AtomicUsize::new(0),
        }
    }

    /// Wall-clock instant at which the run began.
    pub fn start(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
    }

    fn cache(&self) -> MutexGuard<'_, TagTimeCache> {
        self.tag_times.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached instant for a tag name.
    pub fn cached_time(&self, name: &str) -> Option<DateTime<Utc>> {
        self.cache().get(name)
    }

    /// Store an instant, returning whichever value the cache now holds.
    pub fn store_time(&self, name: &str, at: DateTime<Utc>) -> DateTime<Utc> {
        let mut cache = self.cache();
        cache.insert(name, at);
        cache.get(name).unwrap_or(at)
    }

    /// Number of cached tag instants.
    pub fn cached_tags(&self) -> usize {
        self.cache().len()
    }

    pub fn add_events(&self, count: usize) {
        self.events_fetched.fetch_add(count, Ordering::Relaxed);
    }

    /// Total events fetched so far in this run.
    pub fn events_fetched(&self) -> usize {
        self.events_fetched.load(Ordering::Relaxed)
    }
}
