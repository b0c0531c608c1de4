//! Response cache capability.
//!
//! Keys are resolved request URIs. The pipeline only ever stores responses
//! that came back from a successful round trip.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::Response;

pub trait CacheGateway: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Response>;

    fn set(&self, value: Response, key: &str);
}

/// Caches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheGateway for NoCache {
    fn has(&self, _key: &str) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Option<Response> {
        None
    }

    fn set(&self, _value: Response, _key: &str) {}
}

/// Process-local cache without expiry.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Response>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Response>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CacheGateway for InMemoryCache {
    fn has(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Response> {
        self.lock().get(key).cloned()
    }

    fn set(&self, value: Response, key: &str) {
        self.lock().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> Response {
        Response {
            status_code: 200,
            status_text: "OK".to_string(),
            body: body.to_string(),
            rate_limit_limit: 60,
            rate_limit_remaining: 58,
            link_next: None,
            link_previous: None,
            link_first: None,
            link_last: None,
        }
    }

    #[test]
    fn in_memory_cache_stores_and_returns() {
        let cache = InMemoryCache::new();
        assert!(!cache.has("http://h/a"));
        cache.set(response("a"), "http://h/a");
        assert!(cache.has("http://h/a"));
        assert_eq!(cache.get("http://h/a").unwrap().body, "a");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn in_memory_cache_overwrites_same_key() {
        let cache = InMemoryCache::new();
        cache.set(response("old"), "k");
        cache.set(response("new"), "k");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap().body, "new");
    }

    #[test]
    fn clear_empties_cache() {
        let cache = InMemoryCache::new();
        cache.set(response("a"), "k");
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn no_cache_never_hits() {
        NoCache.set(response("a"), "k");
        assert!(!NoCache.has("k"));
        assert!(NoCache.get("k").is_none());
    }
}
