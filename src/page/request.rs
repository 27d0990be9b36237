// src/page/request.rs
// =============================================================================
// A Request is one planned fetch.
//
// It carries:
// - the absolute URL being fetched
// - the outgoing headers (User-Agent is filled in by the collector)
// - the depth: 1 for the seed URL, parent depth + 1 for every child
// - a Context shared with the Response that will come back
//
// It also keeps a weak handle to the collector that created it. That handle is
// how callbacks queue more work: `request.visit("/next")` resolves the link
// against this page and schedules it one level deeper.
//
// Rust concepts:
// - Weak<T>: a pointer that does not keep the collector alive
// - &mut self: pre-request callbacks get to edit headers before sending
// =============================================================================

use reqwest::header::HeaderMap;
use std::sync::Weak;
use url::Url;

use super::Context;
use crate::collector::{ChildVisit, Collector, Shared};
use crate::error::CrawlError;

#[derive(Debug)]
pub struct Request {
    url: Url,
    headers: HeaderMap,
    depth: usize,
    ctx: Context,
    collector: Weak<Shared>,
}

impl Request {
    pub(crate) fn new(url: Url, headers: HeaderMap, depth: usize, collector: Weak<Shared>) -> Self {
        Self {
            url,
            headers,
            depth,
            ctx: Context::new(),
            collector,
        }
    }

    /// The parsed, absolute URL of this request.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable headers; changes made by pre-request callbacks are sent.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Number of hops from the seed URL (the seed itself is depth 1).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// The collector running this request, while it is still alive.
    ///
    /// Callbacks that need the collector (to register more callbacks, to read
    /// settings) should reach it through here instead of capturing a clone:
    /// a captured Collector lives in the collector's own registry and keeps
    /// it from ever being freed.
    pub fn collector(&self) -> Option<Collector> {
        Collector::upgrade(&self.collector)
    }

    /// Resolves a possibly relative link against this request's URL.
    ///
    /// Returns an empty string for in-page anchors ("#top") and for links that
    /// cannot be resolved. The fragment of the result is always stripped, and
    /// protocol-relative links ("//host/path") keep this request's scheme.
    pub fn absolute_url(&self, link: &str) -> String {
        if link.starts_with('#') {
            return String::new();
        }

        match self.url.join(link) {
            Ok(mut resolved) => {
                resolved.set_fragment(None);
                resolved.to_string()
            }
            Err(_) => String::new(),
        }
    }

    /// Schedules a fetch of `link` (resolved with `absolute_url`) at
    /// `depth + 1`.
    ///
    /// The child fetch runs as its own task and is counted as in flight before
    /// this returns, so `Collector::wait` always covers it. Awaiting
    /// `ChildVisit::join` yields the child's result; dropping the handle lets
    /// the fetch run unobserved.
    pub fn visit(&self, link: &str) -> ChildVisit {
        let url = self.absolute_url(link);

        match self.collector.upgrade() {
            Some(shared) => Shared::spawn_visit(&shared, url, self.depth + 1),
            None => ChildVisit::failed(url.clone(), CrawlError::CollectorDropped { url }),
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Weak instead of Arc?
//    - The collector owns the callbacks, the callbacks see Requests
//    - If a Request held an Arc, a callback that stashed a Request somewhere
//      could keep the whole collector alive forever
//    - upgrade() turns the Weak back into an Arc only while we need it
//
//    - collector() hands out a full Collector for the length of a callback;
//      it is dropped again when the callback returns
//
// 2. Url::join does the heavy lifting:
//    - "/docs"          -> same host, new path
//    - "../about"       -> relative to the current directory
//    - "//cdn.test/x"   -> same scheme, new host
//    - "https://x.test" -> already absolute, returned as is
// -----------------------------------------------------------------------------
