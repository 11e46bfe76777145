//! Memory Bank
//!
//! TTL result cache keyed by normalized claim, plus the single-flight
//! table that deduplicates concurrent identical requests. Both tables
//! need atomic check-and-set registration; the dashmap entry API gives
//! that per key.
//!
//! Eviction is lazy-on-read: an expired entry reads as a miss and is
//! removed. `sweep` does the same in bulk for periodic cleanup.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::debug;

use crosscheck_core::ClaimAnalysis;

struct CacheEntry {
    analysis: ClaimAnalysis,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Cache hit/miss accounting
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

type FlightReceiver = watch::Receiver<Option<ClaimAnalysis>>;
type FlightTable = Arc<DashMap<String, FlightReceiver>>;

/// Result of attempting to register as the computation owner for a key
pub enum Flight {
    /// This caller owns the computation and must publish via `complete`
    Owner(FlightOwner),
    /// Another computation is in flight; await its shared result
    Waiter(FlightReceiver),
}

/// Owner side of a single-flight registration.
///
/// The registration is cleared on every exit path: `complete` publishes
/// the result, and dropping an owner that never completed releases any
/// waiters with a degraded result instead of wedging them.
pub struct FlightOwner {
    key: String,
    claim: String,
    tx: Option<watch::Sender<Option<ClaimAnalysis>>>,
    table: FlightTable,
}

impl FlightOwner {
    /// Publish the result to all waiters and clear the registration
    pub fn complete(mut self, analysis: &ClaimAnalysis) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(analysis.clone()));
        }
        self.table.remove(&self.key);
    }
}

impl Drop for FlightOwner {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(ClaimAnalysis::unverified(
                &self.claim,
                "Verification was interrupted before completing. Please retry.",
            )));
            self.table.remove(&self.key);
        }
    }
}

/// Await the shared result of an in-flight computation
pub async fn await_flight(mut rx: FlightReceiver) -> Option<ClaimAnalysis> {
    loop {
        {
            let current = rx.borrow().clone();
            if current.is_some() {
                return current;
            }
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

/// In-process store for verified claims
pub struct MemoryBank {
    entries: DashMap<String, CacheEntry>,
    inflight: FlightTable,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            inflight: Arc::new(DashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a stored analysis. Expired entries read as misses and are
    /// evicted. Hits come back with `cached = true`.
    pub fn get(&self, key: &str) -> Option<ClaimAnalysis> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let mut analysis = entry.analysis.clone();
                analysis.cached = true;
                return Some(analysis);
            }
        }

        self.entries.remove_if(key, |_, entry| entry.is_expired());
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store an analysis under a key, replacing any previous entry
    pub fn put(&self, key: &str, analysis: ClaimAnalysis, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                analysis,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Register as computation owner for a key, or join the existing one.
    /// Registration is atomic: exactly one concurrent caller becomes owner.
    pub fn begin(&self, key: &str, claim: &str) -> Flight {
        match self.inflight.entry(key.to_string()) {
            Entry::Occupied(occupied) => Flight::Waiter(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let (tx, rx) = watch::channel(None);
                vacant.insert(rx);
                Flight::Owner(FlightOwner {
                    key: key.to_string(),
                    claim: claim.to_string(),
                    tx: Some(tx),
                    table: self.inflight.clone(),
                })
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.len(),
        }
    }

    /// Bulk-evict expired entries. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Swept {} expired cache entries", removed);
        }
        removed
    }
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosscheck_core::Verdict;

    fn analysis(claim: &str) -> ClaimAnalysis {
        ClaimAnalysis::unverified(claim, "note")
    }

    #[test]
    fn test_put_get_round_trip_sets_cached() {
        let bank = MemoryBank::new();
        bank.put("k1", analysis("the dam burst"), Duration::from_secs(60));

        let hit = bank.get("k1").unwrap();
        assert!(hit.cached);
        assert_eq!(hit.claim, "the dam burst");
        assert_eq!(hit.final_verdict, Verdict::Unverified);
    }

    #[test]
    fn test_miss_and_hit_accounting() {
        let bank = MemoryBank::new();
        assert!(bank.get("absent").is_none());
        bank.put("k1", analysis("c"), Duration::from_secs(60));
        bank.get("k1");

        let stats = bank.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let bank = MemoryBank::new();
        bank.put("k1", analysis("c"), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(bank.get("k1").is_none());
        assert_eq!(bank.stats().size, 0, "expired entry lazily evicted");
        assert_eq!(bank.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_only() {
        let bank = MemoryBank::new();
        bank.put("old", analysis("a"), Duration::from_millis(10));
        bank.put("fresh", analysis("b"), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(bank.sweep(), 1);
        assert_eq!(bank.stats().size, 1);
    }

    #[test]
    fn test_single_owner_per_key() {
        let bank = MemoryBank::new();
        let first = bank.begin("k", "claim");
        let second = bank.begin("k", "claim");

        assert!(matches!(first, Flight::Owner(_)));
        assert!(matches!(second, Flight::Waiter(_)));
    }

    #[tokio::test]
    async fn test_waiter_receives_owner_result() {
        let bank = MemoryBank::new();

        let owner = match bank.begin("k", "claim") {
            Flight::Owner(o) => o,
            Flight::Waiter(_) => panic!("first caller must own"),
        };
        let rx = match bank.begin("k", "claim") {
            Flight::Waiter(rx) => rx,
            Flight::Owner(_) => panic!("second caller must wait"),
        };

        let waiter = tokio::spawn(await_flight(rx));

        let mut result = analysis("claim");
        result.explanation = "owner result".to_string();
        owner.complete(&result);

        let received = waiter.await.unwrap().unwrap();
        assert_eq!(received.explanation, "owner result");

        // Key is free again after completion
        assert!(matches!(bank.begin("k", "claim"), Flight::Owner(_)));
    }

    #[tokio::test]
    async fn test_dropped_owner_releases_waiters() {
        let bank = MemoryBank::new();

        let owner = match bank.begin("k", "claim") {
            Flight::Owner(o) => o,
            Flight::Waiter(_) => panic!("first caller must own"),
        };
        let rx = match bank.begin("k", "claim") {
            Flight::Waiter(rx) => rx,
            Flight::Owner(_) => panic!("second caller must wait"),
        };

        drop(owner);

        let received = await_flight(rx).await.unwrap();
        assert_eq!(received.final_verdict, Verdict::Unverified);
        assert!(matches!(bank.begin("k", "claim"), Flight::Owner(_)));
    }
}
