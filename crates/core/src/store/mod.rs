//! Storage Engine Module
//!
//! The key-value engine: a concurrent map from string keys to
//! `(value, deadline)` entries, hit/miss counters, and the dispatcher that
//! keeps the eviction policy and the append-only log in sync with every
//! mutation.
//!
//! ## Modules
//!
//! - `aof` - Append-only log persistence support
//! - `entry` - Entry value and TTL deadline
//! - `eviction` - Pluggable eviction policies (LRU default)
//! - `expiration` - Background expiration task
//!
//! ## Invariants
//!
//! After any public operation returns: a key is in the map iff the
//! eviction policy tracks it; the map holds at most `capacity` entries
//! after a mutating operation; every committed mutation has been enqueued
//! to the log before the operation returns. Log records are enqueued while
//! the mutated shard is still locked, so log order matches the
//! linearization order of mutations, and an eviction's DEL record always
//! follows the record of the mutation that triggered it.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::pattern::Pattern;

pub mod aof;
pub mod entry;
pub mod eviction;
pub mod expiration;

pub use aof::AofLog;
pub use entry::{Entry, NO_EXPIRY, now_millis};
pub use eviction::{EvictionPolicy, LruPolicy};
pub use expiration::{Sweeper, SweeperConfig};

/// Shared handle to the key-value engine. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    /// In-memory data: key -> (value, deadline)
    data: DashMap<String, Entry>,
    /// Eviction policy (internally synchronized)
    policy: Box<dyn EvictionPolicy>,
    /// GET hit counter
    hits: AtomicU64,
    /// GET miss counter
    misses: AtomicU64,
    /// Optional append-only log
    aof: Option<AofLog>,
}

impl Store {
    /// Create an engine with LRU eviction bounded at `capacity` entries
    /// and no persistence.
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(Box::new(LruPolicy::new(capacity)), None)
    }

    /// Create an engine with LRU eviction and an append-only log.
    pub fn with_aof(capacity: usize, aof: AofLog) -> Self {
        Self::with_policy(Box::new(LruPolicy::new(capacity)), Some(aof))
    }

    /// Create an engine with a custom eviction policy.
    pub fn with_policy(policy: Box<dyn EvictionPolicy>, aof: Option<AofLog>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                data: DashMap::new(),
                policy,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                aof,
            }),
        }
    }

    /// Return true if append-only logging is enabled.
    pub fn aof_enabled(&self) -> bool {
        self.inner.aof.is_some()
    }

    /// Replay the attached append-only log into this engine.
    ///
    /// Replayed operations are applied without re-enqueueing to the log,
    /// so the file does not grow across restarts. Returns the number of
    /// non-blank lines processed.
    pub fn replay_log(&self) -> Result<u64> {
        let path = match &self.inner.aof {
            Some(aof) => aof.path().to_path_buf(),
            None => return Ok(0),
        };
        AofLog::replay(&path, |line| self.apply_log_record(line))
    }

    /// Drain and close the append-only log writer.
    pub async fn close(&self) {
        if let Some(aof) = &self.inner.aof {
            aof.close().await;
        }
    }

    // ========== Read Operations ==========

    /// Get a value by key.
    ///
    /// Counts a hit or a miss, refreshes recency on a hit, and removes the
    /// key when it is found expired (lazy expiration).
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = match self.inner.data.get(key) {
            Some(entry) => entry,
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.is_expired() {
            let snapshot = entry.value().clone();
            drop(entry);
            self.remove_expired(key, &snapshot);
            self.inner.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let value = entry.value().value().to_string();
        drop(entry);

        self.inner.policy.record_access(key);
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Check if a key exists and is not expired. Lazy-expires, does not
    /// touch the hit/miss counters.
    pub fn exists(&self, key: &str) -> bool {
        let entry = match self.inner.data.get(key) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.is_expired() {
            let snapshot = entry.value().clone();
            drop(entry);
            self.remove_expired(key, &snapshot);
            return false;
        }
        true
    }

    /// Remaining TTL in milliseconds, -1 when no expiration is set, -2
    /// when the key is missing or already expired. No side effects.
    pub fn ttl(&self, key: &str) -> i64 {
        match self.inner.data.get(key) {
            Some(entry) if !entry.is_expired() => entry.ttl_millis(),
            _ => -2,
        }
    }

    /// Length in bytes of the value, 0 when missing or expired. No side
    /// effects.
    pub fn strlen(&self, key: &str) -> usize {
        match self.inner.data.get(key) {
            Some(entry) if !entry.is_expired() => entry.value().value().len(),
            _ => 0,
        }
    }

    /// Classify a key as `none`, `string`, `number` or `ttl_key`.
    ///
    /// A live key with a deadline is `ttl_key`; otherwise `number` when
    /// the value parses as a signed 64-bit integer or a double.
    pub fn key_type(&self, key: &str) -> &'static str {
        let entry = match self.inner.data.get(key) {
            Some(entry) => entry,
            None => return "none",
        };
        if entry.is_expired() {
            let snapshot = entry.value().clone();
            drop(entry);
            self.remove_expired(key, &snapshot);
            return "none";
        }
        if entry.has_ttl() {
            return "ttl_key";
        }
        let value = entry.value().value();
        if value.parse::<i64>().is_ok() || value.parse::<f64>().is_ok() {
            "number"
        } else {
            "string"
        }
    }

    /// Live keys matching a glob pattern. The map is iterated without a
    /// snapshot, so a concurrent SET may or may not be observed.
    pub fn keys(&self, pattern: &Pattern) -> Vec<String> {
        self.inner
            .data
            .iter()
            .filter(|item| !item.value().is_expired())
            .filter(|item| pattern.matches(item.key().as_bytes()))
            .map(|item| item.key().clone())
            .collect()
    }

    /// Values for multiple keys, aligned to the input; each lookup behaves
    /// like [`Store::get`].
    pub fn mget(&self, keys: &[String]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Snapshot of live `(key, value)` pairs. No cross-key atomicity.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.inner
            .data
            .iter()
            .filter(|item| !item.value().is_expired())
            .map(|item| (item.key().clone(), item.value().value().to_string()))
            .collect()
    }

    /// Number of entries currently in the map (expired-but-unswept keys
    /// included).
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.inner.misses.load(Ordering::Relaxed)
    }

    // ========== Mutating Operations ==========

    /// Store a value, replacing any previous entry, with an optional TTL.
    pub fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.apply_set(key, value, ttl, true);
    }

    /// Remove a key. Returns true iff an entry was removed.
    pub fn del(&self, key: &str) -> bool {
        self.apply_del(key, true)
    }

    /// Clear the TTL of a live key. Returns true iff the key had a TTL to
    /// clear.
    pub fn persist(&self, key: &str) -> bool {
        self.apply_persist(key, true)
    }

    /// Set the TTL of a live key to `seconds` from now. Returns false when
    /// the key is missing or expired.
    pub fn expire(&self, key: &str, seconds: u64) -> bool {
        self.apply_expire(key, seconds, true)
    }

    /// Append `suffix` to the value, creating the key when missing or
    /// expired. Returns the new length in bytes.
    pub fn append(&self, key: &str, suffix: &str) -> usize {
        self.apply_append(key, suffix, true)
    }

    /// Increment the integer value by one, creating the key at 1.
    pub fn incr(&self, key: &str) -> Result<i64> {
        self.apply_step(key, 1, true)
    }

    /// Decrement the integer value by one, creating the key at -1.
    pub fn decr(&self, key: &str) -> Result<i64> {
        self.apply_step(key, -1, true)
    }

    /// Store multiple pairs from a flat `k1 v1 k2 v2 ...` list. An odd or
    /// empty list is a silent no-op. A single combined record is logged;
    /// the per-pair stores are not logged individually.
    pub fn mset(&self, kv: &[String]) {
        self.apply_mset(kv, true);
    }

    /// Rebind `src` to `dst`, overwriting `dst`. Returns true iff `src`
    /// existed and was alive.
    pub fn rename(&self, src: &str, dst: &str) -> bool {
        self.apply_rename(src, dst, true)
    }

    /// Remove every entry.
    pub fn flush_all(&self) {
        self.apply_flush_all(true);
    }

    // ========== Expiration Sweep ==========

    /// Remove entries whose deadline has passed. Uses compare-and-remove
    /// so a racing SET with a fresh deadline is not clobbered. Never
    /// writes to the log. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = now_millis();
        let mut stale = Vec::new();
        for item in self.inner.data.iter() {
            let deadline = item.value().expire_at_millis();
            if deadline > 0 && deadline <= now {
                stale.push((item.key().clone(), item.value().clone()));
            }
        }

        let mut removed = 0;
        for (key, snapshot) in stale {
            if self
                .inner
                .data
                .remove_if(&key, |_, current| current == &snapshot)
                .is_some()
            {
                self.inner.policy.record_remove(&key);
                removed += 1;
            }
        }
        removed
    }

    // ========== Log Replay ==========

    /// Apply one append-only log record to the engine without re-logging.
    ///
    /// Unknown verbs and malformed records are logged and skipped so a
    /// partially damaged file still replays.
    pub fn apply_log_record(&self, line: &str) {
        let fields = aof::split_record(line);
        if fields.is_empty() {
            return;
        }

        let verb = fields[0].to_ascii_uppercase();
        match verb.as_str() {
            "SET" => {
                if fields.len() < 3 {
                    warn!(line, "short SET record in append-only log, skipped");
                    return;
                }
                let key = aof::unescape(&fields[1]);
                let value = aof::unescape(&fields[2]);
                let mut ttl = None;
                if fields.len() >= 5 && fields[3].eq_ignore_ascii_case("PX") {
                    match fields[4].parse::<u64>() {
                        Ok(ms) if ms > 0 => ttl = Some(Duration::from_millis(ms)),
                        Ok(_) => {}
                        Err(_) => {
                            warn!(line, "bad PX value in append-only log, skipped");
                            return;
                        }
                    }
                }
                self.apply_set(&key, &value, ttl, false);
            }
            "DEL" => {
                if fields.len() >= 2 {
                    self.apply_del(&aof::unescape(&fields[1]), false);
                }
            }
            "PERSIST" => {
                if fields.len() >= 2 {
                    self.apply_persist(&aof::unescape(&fields[1]), false);
                }
            }
            "EXPIRE" => {
                if fields.len() < 3 {
                    return;
                }
                match fields[2].parse::<u64>() {
                    Ok(seconds) => {
                        self.apply_expire(&aof::unescape(&fields[1]), seconds, false);
                    }
                    Err(_) => warn!(line, "bad EXPIRE seconds in append-only log, skipped"),
                }
            }
            "APPEND" => {
                if fields.len() >= 3 {
                    self.apply_append(&aof::unescape(&fields[1]), &aof::unescape(&fields[2]), false);
                }
            }
            "INCR" => {
                if fields.len() >= 2 {
                    if let Err(e) = self.apply_step(&aof::unescape(&fields[1]), 1, false) {
                        warn!(error = %e, line, "INCR failed during replay, skipped");
                    }
                }
            }
            "DECR" => {
                if fields.len() >= 2 {
                    if let Err(e) = self.apply_step(&aof::unescape(&fields[1]), -1, false) {
                        warn!(error = %e, line, "DECR failed during replay, skipped");
                    }
                }
            }
            "MSET" => {
                let kv: Vec<String> = fields[1..].iter().map(|f| aof::unescape(f)).collect();
                self.apply_mset(&kv, false);
            }
            "RENAME" => {
                if fields.len() >= 3 {
                    self.apply_rename(&aof::unescape(&fields[1]), &aof::unescape(&fields[2]), false);
                }
            }
            "FLUSHALL" => self.apply_flush_all(false),
            other => warn!(verb = %other, "unknown verb in append-only log, skipped"),
        }
    }

    // ========== Internal Dispatch ==========
    //
    // Each apply_* takes a `log` flag: public operations pass true, the
    // replay dispatcher passes false so replay never re-appends.

    fn apply_set(&self, key: &str, value: &str, ttl: Option<Duration>, log: bool) {
        let ttl_ms = ttl.map(|d| d.as_millis() as i64);
        let expire_at = match ttl_ms {
            Some(ms) => now_millis() + ms,
            None => NO_EXPIRY,
        };

        match self.inner.data.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                occupied.insert(Entry::new(value.to_string(), expire_at));
                if log {
                    self.log_set_record(key, value, ttl_ms);
                }
            }
            MapEntry::Vacant(vacant) => {
                let guard = vacant.insert(Entry::new(value.to_string(), expire_at));
                if log {
                    self.log_set_record(key, value, ttl_ms);
                }
                drop(guard);
            }
        }

        self.inner.policy.record_put(key);
        self.evict_if_needed(log);
    }

    fn apply_del(&self, key: &str, log: bool) -> bool {
        match self.inner.data.entry(key.to_string()) {
            MapEntry::Occupied(occupied) => {
                if log {
                    self.log_record(&["DEL", key]);
                }
                occupied.remove();
                self.inner.policy.record_remove(key);
                true
            }
            MapEntry::Vacant(_) => false,
        }
    }

    fn apply_persist(&self, key: &str, log: bool) -> bool {
        let mut entry = match self.inner.data.get_mut(key) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.is_expired() {
            let snapshot = entry.value().clone();
            drop(entry);
            self.remove_expired(key, &snapshot);
            return false;
        }
        if !entry.has_ttl() {
            return false;
        }
        entry.set_expire_at_millis(NO_EXPIRY);
        if log {
            self.log_record(&["PERSIST", key]);
        }
        true
    }

    fn apply_expire(&self, key: &str, seconds: u64, log: bool) -> bool {
        let mut entry = match self.inner.data.get_mut(key) {
            Some(entry) => entry,
            None => return false,
        };
        if entry.is_expired() {
            let snapshot = entry.value().clone();
            drop(entry);
            self.remove_expired(key, &snapshot);
            return false;
        }
        entry.set_expire_at_millis(now_millis() + seconds as i64 * 1000);
        if log {
            let seconds = seconds.to_string();
            self.log_record(&["EXPIRE", key, &seconds]);
        }
        true
    }

    fn apply_append(&self, key: &str, suffix: &str, log: bool) -> usize {
        let new_len = match self.inner.data.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let current = occupied.get();
                let next = if current.is_expired() {
                    Entry::persistent(suffix.to_string())
                } else {
                    // A logically new value; the TTL carries over
                    Entry::new(
                        format!("{}{}", current.value(), suffix),
                        current.expire_at_millis(),
                    )
                };
                let new_len = next.value().len();
                occupied.insert(next);
                if log {
                    self.log_record(&["APPEND", key, suffix]);
                }
                new_len
            }
            MapEntry::Vacant(vacant) => {
                let guard = vacant.insert(Entry::persistent(suffix.to_string()));
                if log {
                    self.log_record(&["APPEND", key, suffix]);
                }
                drop(guard);
                suffix.len()
            }
        };

        self.inner.policy.record_put(key);
        self.evict_if_needed(log);
        new_len
    }

    fn apply_step(&self, key: &str, delta: i64, log: bool) -> Result<i64> {
        let verb = if delta >= 0 { "INCR" } else { "DECR" };

        let next = match self.inner.data.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let next = if occupied.get().is_expired() {
                    occupied.insert(Entry::persistent(delta.to_string()));
                    delta
                } else {
                    let current = occupied
                        .get()
                        .value()
                        .parse::<i64>()
                        .map_err(|_| StoreError::NotInteger)?;
                    let next = current.checked_add(delta).ok_or(StoreError::Overflow)?;
                    let expire_at = occupied.get().expire_at_millis();
                    occupied.insert(Entry::new(next.to_string(), expire_at));
                    next
                };
                if log {
                    self.log_record(&[verb, key]);
                }
                next
            }
            MapEntry::Vacant(vacant) => {
                let guard = vacant.insert(Entry::persistent(delta.to_string()));
                if log {
                    self.log_record(&[verb, key]);
                }
                drop(guard);
                delta
            }
        };

        self.inner.policy.record_put(key);
        self.evict_if_needed(log);
        Ok(next)
    }

    fn apply_mset(&self, kv: &[String], log: bool) {
        // Silent no-op on an odd or empty pair list
        if kv.is_empty() || kv.len() % 2 != 0 {
            return;
        }

        for pair in kv.chunks(2) {
            self.inner
                .data
                .insert(pair[0].clone(), Entry::persistent(pair[1].clone()));
            self.inner.policy.record_put(&pair[0]);
        }

        if log {
            let mut fields: Vec<&str> = Vec::with_capacity(kv.len() + 1);
            fields.push("MSET");
            fields.extend(kv.iter().map(String::as_str));
            self.log_record(&fields);
        }

        // One eviction pass per inserted pair keeps the capacity bound,
        // with every eviction DEL ordered after the combined record
        for _ in 0..kv.len() / 2 {
            self.evict_if_needed(log);
        }
    }

    fn apply_rename(&self, src: &str, dst: &str, log: bool) -> bool {
        let (_, entry) = match self.inner.data.remove(src) {
            Some(removed) => removed,
            None => return false,
        };
        self.inner.policy.record_remove(src);

        if entry.is_expired() {
            // The source was already logically gone
            return false;
        }

        self.inner.data.insert(dst.to_string(), entry);
        self.inner.policy.record_put(dst);
        if log {
            self.log_record(&["RENAME", src, dst]);
        }
        true
    }

    fn apply_flush_all(&self, log: bool) {
        let keys: Vec<String> = self.inner.data.iter().map(|item| item.key().clone()).collect();
        for key in keys {
            if self.inner.data.remove(&key).is_some() {
                self.inner.policy.record_remove(&key);
            }
        }
        if log {
            self.log_record(&["FLUSHALL"]);
        }
    }

    // ========== Helpers ==========

    /// Remove a key only if it still holds the observed snapshot, so a
    /// racing SET is not clobbered.
    fn remove_expired(&self, key: &str, snapshot: &Entry) {
        if self
            .inner
            .data
            .remove_if(key, |_, current| current == snapshot)
            .is_some()
        {
            self.inner.policy.record_remove(key);
        }
    }

    /// Ask the policy for a victim when the map has outgrown capacity. The
    /// eviction DEL is logged after the record of the triggering mutation.
    fn evict_if_needed(&self, log: bool) {
        if let Some(victim) = self.inner.policy.evict_if_needed(self.inner.data.len()) {
            if self.inner.data.remove(&victim).is_some() {
                debug!(key = %victim, "evicted least-recently-used key");
                if log {
                    self.log_record(&["DEL", &victim]);
                }
            }
        }
    }

    fn log_record(&self, fields: &[&str]) {
        if let Some(aof) = &self.inner.aof {
            aof.append(aof::encode_record(fields));
        }
    }

    fn log_set_record(&self, key: &str, value: &str, ttl_ms: Option<i64>) {
        match ttl_ms {
            Some(ms) => {
                let ms = ms.to_string();
                self.log_record(&["SET", key, value, "PX", &ms]);
            }
            None => self.log_record(&["SET", key, value]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_del_roundtrip() {
        let store = Store::new(100);
        store.set("foo", "bar", None);
        assert_eq!(store.get("foo"), Some("bar".to_string()));
        assert!(store.del("foo"));
        assert_eq!(store.get("foo"), None);
        assert!(!store.del("foo"));
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let store = Store::new(100);
        store.set("k", "v", None);
        store.get("k");
        store.get("k");
        store.get("missing");
        assert_eq!(store.hits(), 2);
        assert_eq!(store.misses(), 1);

        // Reads other than GET never touch the counters
        store.exists("k");
        store.ttl("k");
        store.strlen("k");
        store.key_type("k");
        assert_eq!(store.hits() + store.misses(), 3);
    }

    #[test]
    fn test_ttl_reporting() {
        let store = Store::new(100);
        store.set("plain", "v", None);
        store.set("timed", "v", Some(Duration::from_millis(10_000)));

        assert_eq!(store.ttl("missing"), -2);
        assert_eq!(store.ttl("plain"), -1);
        let remaining = store.ttl("timed");
        assert!(remaining > 0 && remaining <= 10_000);
    }

    #[test]
    fn test_ttl_of_expired_key_is_missing() {
        let store = Store::new(100);
        store.set("t", "v", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.ttl("t"), -2);
    }

    #[test]
    fn test_lazy_expiration_on_get() {
        let store = Store::new(100);
        store.set("t", "v", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.get("t"), None);
        assert_eq!(store.misses(), 1);
        // The read removed the entry from the map
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_persist_clears_ttl() {
        let store = Store::new(100);
        store.set("t", "v", Some(Duration::from_millis(10_000)));
        assert!(store.persist("t"));
        assert_eq!(store.ttl("t"), -1);

        // Nothing left to clear
        assert!(!store.persist("t"));
        assert!(!store.persist("missing"));
    }

    #[test]
    fn test_expire_sets_deadline() {
        let store = Store::new(100);
        store.set("k", "v", None);
        assert!(store.expire("k", 100));
        let remaining = store.ttl("k");
        assert!(remaining > 0 && remaining <= 100_000);

        assert!(!store.expire("missing", 100));
    }

    #[test]
    fn test_expire_on_expired_key_fails() {
        let store = Store::new(100);
        store.set("t", "v", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert!(!store.expire("t", 100));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_append_creates_and_extends() {
        let store = Store::new(100);
        assert_eq!(store.append("a", "1"), 1);
        assert_eq!(store.append("a", "23"), 3);
        assert_eq!(store.get("a"), Some("123".to_string()));
    }

    #[test]
    fn test_append_preserves_ttl() {
        let store = Store::new(100);
        store.set("a", "x", Some(Duration::from_millis(10_000)));
        store.append("a", "y");
        assert_eq!(store.get("a"), Some("xy".to_string()));
        assert!(store.ttl("a") > 0);
    }

    #[test]
    fn test_append_to_expired_key_starts_fresh() {
        let store = Store::new(100);
        store.set("a", "old", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.append("a", "new"), 3);
        assert_eq!(store.get("a"), Some("new".to_string()));
        assert_eq!(store.ttl("a"), -1);
    }

    #[test]
    fn test_incr_decr_semantics() {
        let store = Store::new(100);
        assert_eq!(store.incr("n").unwrap(), 1);
        assert_eq!(store.incr("n").unwrap(), 2);
        assert_eq!(store.decr("n").unwrap(), 1);

        assert_eq!(store.decr("m").unwrap(), -1);

        store.set("s", "41", None);
        assert_eq!(store.incr("s").unwrap(), 42);

        store.set("s", "abc", None);
        assert!(matches!(store.incr("s"), Err(StoreError::NotInteger)));
    }

    #[test]
    fn test_incr_overflow() {
        let store = Store::new(100);
        store.set("n", &i64::MAX.to_string(), None);
        assert!(matches!(store.incr("n"), Err(StoreError::Overflow)));
    }

    #[test]
    fn test_strlen() {
        let store = Store::new(100);
        assert_eq!(store.strlen("missing"), 0);
        store.set("k", "hello", None);
        assert_eq!(store.strlen("k"), 5);
    }

    #[test]
    fn test_key_type_classification() {
        let store = Store::new(100);
        assert_eq!(store.key_type("missing"), "none");

        store.set("s", "hello", None);
        assert_eq!(store.key_type("s"), "string");

        store.set("i", "42", None);
        assert_eq!(store.key_type("i"), "number");

        store.set("f", "3.25", None);
        assert_eq!(store.key_type("f"), "number");

        store.set("t", "v", Some(Duration::from_millis(10_000)));
        assert_eq!(store.key_type("t"), "ttl_key");
    }

    #[test]
    fn test_keys_filters_by_pattern() {
        let store = Store::new(100);
        store.set("foo1", "v", None);
        store.set("foo2", "v", None);
        store.set("bar", "v", None);

        let mut matched = store.keys(&Pattern::new(b"foo*"));
        matched.sort();
        assert_eq!(matched, vec!["foo1", "foo2"]);

        assert_eq!(store.keys(&Pattern::new(b"*")).len(), 3);
    }

    #[test]
    fn test_keys_skips_expired() {
        let store = Store::new(100);
        store.set("live", "v", None);
        store.set("dead", "v", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.keys(&Pattern::new(b"*")), vec!["live"]);
    }

    #[test]
    fn test_mget_alignment() {
        let store = Store::new(100);
        store.set("a", "1", None);
        store.set("c", "3", None);
        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(
            store.mget(&keys),
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[test]
    fn test_mset_pairs() {
        let store = Store::new(100);
        let kv: Vec<String> = ["a", "1", "b", "2"].iter().map(|s| s.to_string()).collect();
        store.mset(&kv);
        assert_eq!(store.get("a"), Some("1".to_string()));
        assert_eq!(store.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_mset_odd_list_is_silent_noop() {
        let store = Store::new(100);
        let kv: Vec<String> = ["a", "1", "b"].iter().map(|s| s.to_string()).collect();
        store.mset(&kv);
        assert!(store.is_empty());
    }

    #[test]
    fn test_rename() {
        let store = Store::new(100);
        store.set("src", "v", None);
        store.set("dst", "old", None);

        assert!(store.rename("src", "dst"));
        assert_eq!(store.get("src"), None);
        assert_eq!(store.get("dst"), Some("v".to_string()));

        assert!(!store.rename("missing", "other"));
    }

    #[test]
    fn test_rename_keeps_ttl() {
        let store = Store::new(100);
        store.set("src", "v", Some(Duration::from_millis(10_000)));
        assert!(store.rename("src", "dst"));
        assert!(store.ttl("dst") > 0);
    }

    #[test]
    fn test_flush_all() {
        let store = Store::new(100);
        store.set("a", "1", None);
        store.set("b", "2", None);
        store.flush_all();
        assert!(store.is_empty());
        // Eviction state is cleared too: refilling works normally
        store.set("c", "3", None);
        assert_eq!(store.get("c"), Some("3".to_string()));
    }

    #[test]
    fn test_capacity_is_enforced() {
        let store = Store::new(3);
        for i in 0..10 {
            store.set(&format!("k{}", i), "v", None);
        }
        assert!(store.len() <= 3);
    }

    #[test]
    fn test_lru_victim_selection() {
        let store = Store::new(3);
        store.set("k1", "v", None);
        store.set("k2", "v", None);
        store.set("k3", "v", None);

        // Touch k1 so k2 becomes the oldest
        store.get("k1");
        store.set("k4", "v", None);

        assert!(!store.exists("k2"));
        assert!(store.exists("k1"));
        assert!(store.exists("k3"));
        assert!(store.exists("k4"));
    }

    #[test]
    fn test_purge_expired_removes_only_stale() {
        let store = Store::new(100);
        store.set("live", "v", None);
        store.set("timed", "v", Some(Duration::from_millis(10_000)));
        store.set("dead1", "v", Some(Duration::from_millis(5)));
        store.set("dead2", "v", Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.exists("live"));
        assert!(store.exists("timed"));
    }

    #[test]
    fn test_replay_record_parsing() {
        let store = Store::new(100);
        store.apply_log_record("SET a 1");
        store.apply_log_record("APPEND a 2");
        store.apply_log_record("INCR a");
        store.apply_log_record("SET quoted \"two words\"");
        store.apply_log_record("EXPIRE a 1000");
        store.apply_log_record("bogus nonsense here");
        store.apply_log_record("RENAME a b");
        store.apply_log_record("DEL quoted");

        assert_eq!(store.get("b"), Some("13".to_string()));
        assert!(store.ttl("b") > 0);
        assert_eq!(store.get("quoted"), None);
    }

    #[test]
    fn test_replay_set_with_px() {
        let store = Store::new(100);
        store.apply_log_record("SET t v PX 60000");
        assert_eq!(store.key_type("t"), "ttl_key");
        let remaining = store.ttl("t");
        assert!(remaining > 0 && remaining <= 60_000);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = Store::new(100_000);
        let mut handles = vec![];

        for t in 0..4 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    store.set(&format!("key_{}_{}", t, i), &format!("value_{}_{}", t, i), None);
                }
            }));
        }

        for _ in 0..4 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..1000 {
                    let _ = store.get(&format!("key_0_{}", i));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        for t in 0..4 {
            for i in 0..100 {
                assert_eq!(
                    store.get(&format!("key_{}_{}", t, i)),
                    Some(format!("value_{}_{}", t, i))
                );
            }
        }
    }
}
