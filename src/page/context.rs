// src/page/context.rs
// =============================================================================
// A tiny key/value store that travels from a Request to its Response.
//
// A pre-request callback can write something ("started_at", "category", ...)
// and the post-response or element callbacks of the same fetch can read it
// back. Every fetch gets its own Context.
//
// Clones share the same underlying map, which is what lets the Request and the
// Response point at one store. All access goes through a mutex because a
// callback may hand the Context to a child task.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct Context {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl Context {
    /// Creates an empty Context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any earlier value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`, or an empty string if the key
    /// was never set.
    pub fn get(&self, key: &str) -> String {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic inside a callback while holding the lock leaves the map itself
    // intact, so a poisoned lock is still safe to use
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key_is_empty() {
        let ctx = Context::new();
        assert_eq!(ctx.get("missing"), "");
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_put_overwrites() {
        let ctx = Context::new();
        ctx.put("key", "first");
        ctx.put("key", "second");
        assert_eq!(ctx.get("key"), "second");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let ctx = Context::new();
        let shared = ctx.clone();
        shared.put("seen", "yes");
        assert_eq!(ctx.get("seen"), "yes");
    }

    #[test]
    fn test_concurrent_writers() {
        let ctx = Context::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = ctx.clone();
                std::thread::spawn(move || ctx.put(format!("k{}", i), i.to_string()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(ctx.len(), 8);
        assert_eq!(ctx.get("k3"), "3");
    }
}
