// src/error.rs
// =============================================================================
// Error types for the crawl engine.
//
// Only failures that stop a fetch from happening at all are errors:
// - the URL cannot be parsed
// - the outgoing request cannot be built (bad header value)
// - the transport cannot reach the server
// - the response body cannot be read
//
// An empty URL, an already visited URL or a URL past the depth limit are
// NOT errors. The collector skips them and returns Ok(()).
// =============================================================================

use thiserror::Error;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shorthand used throughout the library.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The URL handed to visit() could not be parsed
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A header value (usually the User-Agent) is not valid in HTTP
    #[error("invalid value for header {name}: {value:?}")]
    InvalidHeader { name: String, value: String },

    /// The transport failed before a response arrived
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The response arrived but its body could not be read
    #[error("reading the body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The collector behind a Request no longer exists
    #[error("collector was dropped before {url} could be visited")]
    CollectorDropped { url: String },

    /// A child visit task panicked or was aborted
    #[error("child visit of {url} did not complete: {reason}")]
    ChildTask { url: String, reason: String },

    /// The default HTTP client could not be constructed
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// A CollectorConfig value was rejected
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CrawlError {
    /// True for errors raised by the network layer (fetch or body read).
    pub fn is_transport(&self) -> bool {
        matches!(self, CrawlError::Fetch { .. } | CrawlError::Body { .. })
    }
}
