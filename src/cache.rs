// src/cache.rs
//! Short-lived, bounded memoization of search results.
//!
//! Entries expire lazily on read. When full, the entry with the oldest
//! insertion timestamp is evicted; reads do not refresh an entry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::SearchCriteria;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CACHE_MAX_SIZE: usize = 100;

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Ok(delta) = chrono::Duration::from_std(by) {
            *now += delta;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub ttl: Duration,
    sequence: u64,
}

impl<T> CacheEntry<T> {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match (now - self.timestamp).to_std() {
            Ok(elapsed) => elapsed > self.ttl,
            // clock went backwards
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub utilization: f64,
}

pub struct SearchCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    max_size: usize,
    default_ttl: Duration,
    next_sequence: u64,
    clock: Arc<dyn Clock>,
}

pub type SharedSearchCache<T> = Arc<Mutex<SearchCache<T>>>;

impl<T: Clone> SearchCache<T> {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            max_size,
            default_ttl,
            next_sequence: 0,
            clock,
        }
    }

    pub fn shared(self) -> SharedSearchCache<T> {
        Arc::new(Mutex::new(self))
    }

    /// Returns `None` both for missing and expired entries. Expired entries
    /// are removed by this call.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now();
        let expired = self.entries.get(key)?.is_expired(now);

        if expired {
            debug!(key, "Cache entry expired");
            self.entries.remove(key);
            return None;
        }

        self.entries.get(key).map(|entry| entry.data.clone())
    }

    pub fn set(&mut self, key: String, data: T, ttl: Option<Duration>) {
        if self.max_size == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
            ttl: ttl.unwrap_or(self.default_ttl),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.entries.insert(key, entry);
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.entries.len();
        CacheStats {
            size,
            max_size: self.max_size,
            utilization: crate::utils::percentage(size, self.max_size),
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.timestamp, entry.sequence))
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            debug!(key = %key, "Evicting oldest cache entry");
            self.entries.remove(&key);
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedCriteria {
    query: String,
    location: Option<String>,
    preferred_locations: Vec<String>,
    sources: Vec<String>,
    job_types: Vec<&'static str>,
    salary: Option<(f64, f64, String)>,
    include: Vec<String>,
    exclude: Vec<String>,
    posted_within_days: Option<u32>,
    max_results: usize,
}

fn sorted_folded(values: Option<&Vec<String>>) -> Vec<String> {
    let mut folded: Vec<String> = values
        .into_iter()
        .flatten()
        .map(|value| crate::utils::fold_label(value))
        .collect();
    folded.sort();
    folded.dedup();
    folded
}

/// Cache key for a search. Identical searches map to the same key whatever
/// the casing or ordering of their multi-valued fields.
pub fn generate_key(criteria: &SearchCriteria) -> String {
    let mut job_types: Vec<&'static str> = criteria
        .job_types
        .iter()
        .flatten()
        .map(|job_type| job_type.as_str())
        .collect();
    job_types.sort_unstable();
    job_types.dedup();

    let keywords = criteria.keywords.as_ref();
    let normalized = NormalizedCriteria {
        query: crate::utils::fold_label(&criteria.query),
        location: criteria
            .location
            .as_deref()
            .map(crate::utils::fold_label)
            .filter(|location| !location.is_empty()),
        preferred_locations: sorted_folded(criteria.preferred_locations.as_ref()),
        sources: sorted_folded(criteria.sources.as_ref()),
        job_types,
        salary: criteria
            .salary
            .as_ref()
            .map(|salary| (salary.min, salary.max, salary.currency.to_uppercase())),
        include: sorted_folded(keywords.map(|k| &k.include)),
        exclude: sorted_folded(keywords.map(|k| &k.exclude)),
        posted_within_days: criteria.posted_within_days,
        max_results: criteria.max_results,
    };

    match serde_json::to_string(&normalized) {
        Ok(serialized) => format!("jobs:{}", serialized),
        Err(e) => {
            warn!("Failed to serialize cache key, falling back to debug form: {}", e);
            format!(
                "jobs:{}|{}|{}|{}",
                normalized.query,
                normalized.location.unwrap_or_default(),
                normalized.sources.join(","),
                normalized.max_results
            )
        }
    }
}
