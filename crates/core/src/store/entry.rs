//! Entry Module
//!
//! A stored value together with its absolute expiration deadline. Deadlines
//! are epoch milliseconds (not monotonic instants) because the append-only
//! log reconstructs them across process restarts.

use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel deadline meaning "no expiration".
pub const NO_EXPIRY: i64 = -1;

/// Current wall clock as epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// One stored key's value and expiration deadline.
///
/// The value is immutable for the lifetime of an `Entry`; operations that
/// change it (APPEND, INCR, DECR) replace the whole entry, so concurrent
/// readers observe either the old or the new value, never a torn one.
/// `PartialEq` enables compare-and-remove against a previously observed
/// snapshot without clobbering a racing SET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    value: String,
    expire_at_millis: i64,
}

impl Entry {
    pub fn new(value: String, expire_at_millis: i64) -> Self {
        Self {
            value,
            expire_at_millis,
        }
    }

    /// Create an entry with no expiration.
    pub fn persistent(value: String) -> Self {
        Self::new(value, NO_EXPIRY)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expire_at_millis(&self) -> i64 {
        self.expire_at_millis
    }

    pub fn set_expire_at_millis(&mut self, expire_at_millis: i64) {
        self.expire_at_millis = expire_at_millis;
    }

    pub fn has_ttl(&self) -> bool {
        self.expire_at_millis > 0
    }

    /// Check if the entry's deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.expire_at_millis > 0 && now_millis() > self.expire_at_millis
    }

    /// Remaining TTL in milliseconds, or -1 when no expiration is set.
    pub fn ttl_millis(&self) -> i64 {
        if self.expire_at_millis <= 0 {
            return NO_EXPIRY;
        }
        (self.expire_at_millis - now_millis()).max(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_persistent_entry_never_expires() {
        let e = Entry::persistent("v".to_string());
        assert_eq!(e.expire_at_millis(), NO_EXPIRY);
        assert!(!e.has_ttl());
        assert!(!e.is_expired());
        assert_eq!(e.ttl_millis(), -1);
    }

    #[test]
    fn test_entry_with_deadline() {
        let e = Entry::new("v".to_string(), now_millis() + 10_000);
        assert!(e.has_ttl());
        assert!(!e.is_expired());
        let ttl = e.ttl_millis();
        assert!(ttl > 0 && ttl <= 10_000);
    }

    #[test]
    fn test_entry_expires() {
        let e = Entry::new("v".to_string(), now_millis() + 5);
        assert!(!e.is_expired());
        std::thread::sleep(Duration::from_millis(20));
        assert!(e.is_expired());
        assert_eq!(e.ttl_millis(), -1);
    }

    #[test]
    fn test_clear_ttl() {
        let mut e = Entry::new("v".to_string(), now_millis() + 5);
        e.set_expire_at_millis(NO_EXPIRY);
        std::thread::sleep(Duration::from_millis(20));
        assert!(!e.is_expired());
    }

    #[test]
    fn test_snapshot_equality() {
        let e = Entry::new("v".to_string(), 12345);
        let snapshot = e.clone();
        assert_eq!(e, snapshot);

        let replaced = Entry::new("v2".to_string(), 12345);
        assert_ne!(replaced, snapshot);
    }
}
