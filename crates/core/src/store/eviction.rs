//! Eviction Policies for the Store
//!
//! A policy tracks per-key recency and nominates a single victim when the
//! map has grown past its capacity. The engine never holds a map lock
//! across a policy call; policies synchronize internally.

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Capability set a pluggable eviction policy must provide.
///
/// All methods are safe for concurrent callers.
pub trait EvictionPolicy: Send + Sync {
    /// Mark a key as most-recently-used after a read hit.
    fn record_access(&self, key: &str);

    /// Mark a key as most-recently-used after a write.
    fn record_put(&self, key: &str);

    /// Drop a key from the policy's internal state.
    fn record_remove(&self, key: &str);

    /// Nominate a victim when `current_size` exceeds capacity.
    ///
    /// The returned key has already been dropped from internal state;
    /// the caller is responsible for removing it from the map.
    fn evict_if_needed(&self, current_size: usize) -> Option<String>;

    /// The configured capacity bound.
    fn capacity(&self) -> usize;
}

/// Least-recently-used eviction.
///
/// Recency is an ordered mapping from a monotonically increasing touch
/// tick to the key, with a back-index from key to its current tick.
struct LruState {
    by_age: BTreeMap<u64, String>,
    ticks: HashMap<String, u64>,
    clock: u64,
}

impl LruState {
    fn touch(&mut self, key: &str) {
        if let Some(old) = self.ticks.get(key).copied() {
            self.by_age.remove(&old);
        }
        self.clock += 1;
        self.by_age.insert(self.clock, key.to_string());
        self.ticks.insert(key.to_string(), self.clock);
    }

    fn forget(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.by_age.remove(&tick);
        }
    }

    fn pop_oldest(&mut self) -> Option<String> {
        let oldest = self.by_age.keys().next().copied()?;
        let key = self.by_age.remove(&oldest)?;
        self.ticks.remove(&key);
        Some(key)
    }
}

pub struct LruPolicy {
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruPolicy {
    /// Create a policy bounded at `capacity` entries (clamped to >= 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState {
                by_age: BTreeMap::new(),
                ticks: HashMap::new(),
                clock: 0,
            }),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.state.lock().ticks.len()
    }
}

impl EvictionPolicy for LruPolicy {
    fn record_access(&self, key: &str) {
        self.state.lock().touch(key);
    }

    fn record_put(&self, key: &str) {
        self.state.lock().touch(key);
    }

    fn record_remove(&self, key: &str) {
        self.state.lock().forget(key);
    }

    fn evict_if_needed(&self, current_size: usize) -> Option<String> {
        if current_size <= self.capacity {
            return None;
        }
        self.state.lock().pop_oldest()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
