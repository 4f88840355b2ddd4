//! Process-wide result cache with per-entry expiry.
//!
//! Expired entries are treated as misses on lookup. Every write that adds
//! an entry first sweeps out expired ones, so the map never outgrows the
//! live working set; there is no background sweeper. Writers always
//! overwrite.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use pricepulse_core::{CompetitorAnalysisResult, DiscoveredCompetitor, DiscoveredProduct};
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Product discovery results stay fresh for 30 minutes.
pub const PRODUCT_TTL: Duration = Duration::from_secs(30 * 60);
/// Competitor discovery and per-competitor analyses stay fresh for 6 hours.
pub const COMPETITOR_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Products(Vec<DiscoveredProduct>),
    Competitors(Vec<DiscoveredCompetitor>),
    Analysis(CompetitorAnalysisResult),
    Counter(u64),
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedValue,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the live value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        sweep_expired(&mut entries, now);
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Atomically adds one to the counter under `key` and returns the new
    /// count. A missing or expired counter restarts at 1 with a fresh `ttl`;
    /// a live one keeps its original expiry.
    pub fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_live(now) {
                if let CachedValue::Counter(count) = &mut entry.value {
                    *count += 1;
                    return *count;
                }
            }
        }
        sweep_expired(&mut entries, now);
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value: CachedValue::Counter(1),
                expires_at: now + ttl,
            },
        );
        1
    }

    /// Current value of the counter under `key`, zero if absent or expired.
    #[must_use]
    pub fn counter(&self, key: &str) -> u64 {
        match self.get(key) {
            Some(CachedValue::Counter(count)) => count,
            _ => 0,
        }
    }

    #[must_use]
    pub fn products(&self, key: &str) -> Option<Vec<DiscoveredProduct>> {
        match self.get(key)? {
            CachedValue::Products(products) => Some(products),
            _ => None,
        }
    }

    #[must_use]
    pub fn competitors(&self, key: &str) -> Option<Vec<DiscoveredCompetitor>> {
        match self.get(key)? {
            CachedValue::Competitors(competitors) => Some(competitors),
            _ => None,
        }
    }

    #[must_use]
    pub fn analysis(&self, key: &str) -> Option<CompetitorAnalysisResult> {
        match self.get(key)? {
            CachedValue::Analysis(result) => Some(result),
            _ => None,
        }
    }

    /// Number of stored entries. Entries that expired since the last write
    /// are still counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sweep_expired(entries: &mut HashMap<String, CacheEntry>, now: Instant) {
    let before = entries.len();
    entries.retain(|_, entry| entry.is_live(now));
    let swept = before - entries.len();
    if swept > 0 {
        tracing::debug!(swept, remaining = entries.len(), "dropped expired cache entries");
    }
}

#[must_use]
pub fn products_key(url: &str, locale: &str) -> String {
    format!("products:{url}:{locale}")
}

/// Key for a modified-prompt product discovery; the free-form modification
/// is reduced to a short digest.
#[must_use]
pub fn modified_products_key(url: &str, locale: &str, modification: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(modification.as_bytes()));
    format!("products-modified:{url}:{locale}:{}", &digest[..16])
}

#[must_use]
pub fn competitors_key(url: &str, locale: &str) -> String {
    format!("competitors:{url}:{locale}")
}

#[must_use]
pub fn competitor_products_key(domain: &str) -> String {
    format!("competitor-products:{domain}")
}
