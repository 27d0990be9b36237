// src/collector/visited.rs
// =============================================================================
// The set of URLs the collector has already claimed.
//
// Membership is plain string equality on the URL as it was passed to the
// collector. Children arrive already normalized by Request::absolute_url, so
// "/b" and "/b#top" from the same page land on the same entry.
// =============================================================================

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    // Check and insert happen under one lock, so of two concurrent fetches
    // of the same URL only one gets `true`
    pub(crate) fn claim(&self, url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    pub(crate) fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
