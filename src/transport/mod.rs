// src/transport/mod.rs
// =============================================================================
// The seam between the collector and the network.
//
// The collector never talks to reqwest directly. It asks a Transport to GET a
// URL with some headers and gets back something that has a status, headers
// and a body that still has to be read. Reading the body is a separate step
// because it can fail on its own (connection dropped halfway through).
//
// Submodules:
// - http: the default Transport, backed by a reqwest Client with a cookie jar
//
// Tests swap in an in-memory Transport so no test needs the internet.
//
// Rust concepts:
// - Trait objects (dyn Transport): pick the implementation at runtime
// - BoxFuture: an async method that still works behind `dyn`
// =============================================================================

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpTransport;

use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::CrawlResult;

/// Performs GET requests for the collector.
pub trait Transport: Send + Sync {
    /// Sends a GET request for `url` with `headers`.
    ///
    /// Failing to get a response at all should be reported as
    /// `CrawlError::Fetch`.
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, CrawlResult<Box<dyn TransportResponse>>>;

    /// Stops sending and storing cookies. Calling it twice is harmless.
    fn disable_cookies(&self);
}

/// A response whose body has not been read yet.
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    fn headers(&self) -> &HeaderMap;

    /// Reads the whole body. Failures should be reported as
    /// `CrawlError::Body`.
    fn read_body(self: Box<Self>) -> BoxFuture<'static, CrawlResult<Vec<u8>>>;
}
