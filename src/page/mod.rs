// src/page/mod.rs
// =============================================================================
// The values callbacks get to see during a fetch.
//
// Submodules:
// - context: key/value store shared by a Request and its Response
// - request: the outgoing fetch (URL, headers, depth) and child visits
// - response: status, headers and body of a finished fetch
// - element: one HTML node matched by a selector
//
// All of them live only as long as the fetch that produced them. The
// long-lived state (visited URLs, callbacks) belongs to the Collector.
// =============================================================================

mod context;
mod element;
mod request;
mod response;

pub use context::Context;
pub use element::Element;
pub use request::Request;
pub use response::Response;
