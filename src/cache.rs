// Time-boxed key-value cache for backend responses. The clock is a trait so
// tests can move time by hand instead of sleeping.
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry {
    payload: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// Keyed JSON cache with per-entry expiry. Writes are last-writer-wins;
/// all access happens from a single task (callers wrap in a mutex when a
/// handle has to be shared).
pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
    clock: Box<dyn Clock>,
}

impl TtlCache {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
        }
    }

    /// Returns the cached payload if the entry exists and has not expired.
    /// Expired entries are pruned on read.
    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.payload.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&mut self, key: &str, payload: serde_json::Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at,
            },
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Clock that only moves when told to.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn entry_readable_before_expiry() {
        let clock = ManualClock::new(start());
        let mut cache = TtlCache::new(Box::new(clock.clone()));
        cache.put("brands", serde_json::json!([1, 2, 3]), Duration::minutes(30));

        clock.advance(Duration::minutes(29));
        assert_eq!(cache.get("brands"), Some(serde_json::json!([1, 2, 3])));
    }

    #[test]
    fn entry_gone_after_expiry() {
        let clock = ManualClock::new(start());
        let mut cache = TtlCache::new(Box::new(clock.clone()));
        cache.put("brands", serde_json::json!("payload"), Duration::minutes(30));

        clock.advance(Duration::minutes(31));
        assert_eq!(cache.get("brands"), None);
        // Pruned, not just hidden.
        assert!(cache.is_empty());
    }

    #[test]
    fn rewrite_supersedes_silently() {
        let clock = ManualClock::new(start());
        let mut cache = TtlCache::new(Box::new(clock.clone()));
        cache.put("k", serde_json::json!("old"), Duration::minutes(5));
        cache.put("k", serde_json::json!("new"), Duration::minutes(5));
        assert_eq!(cache.get("k"), Some(serde_json::json!("new")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_drops_entry() {
        let clock = ManualClock::new(start());
        let mut cache = TtlCache::new(Box::new(clock));
        cache.put("analytics_b001", serde_json::json!({}), Duration::minutes(30));
        cache.remove("analytics_b001");
        assert_eq!(cache.get("analytics_b001"), None);
    }
}
