// src/lib.rs
// =============================================================================
// link-collector: a callback-driven web crawling engine.
//
// Give a Collector a seed URL and it fetches the page, runs your callbacks
// before the request, for every HTML element matching a selector, and after
// the response. Callbacks can follow links with `request.visit(...)`; the
// collector keeps each URL to a single fetch and stops at the configured
// depth.
//
//   let collector = Collector::new()?;
//   collector.set_max_depth(2);
//   collector.on_html("a[href]", |e| {
//       e.request().visit(e.attr("href"));
//   });
//   collector.on_response(|r| println!("{} {}", r.status(), r.request().url()));
//   collector.visit("https://example.com/").await?;
//   collector.wait().await;
//
// Modules:
// - collector: the engine (fetch pipeline, callbacks, visited set)
// - page: Request, Response, Element and Context
// - transport: the HTTP seam, with a reqwest-backed default
// - config: CollectorConfig
// - error: CrawlError
// =============================================================================

pub mod collector;
pub mod config;
pub mod error;
pub mod page;
pub mod transport;

pub use collector::{Callback, ChildVisit, Collector};
pub use config::{CollectorConfig, DEFAULT_USER_AGENT};
pub use error::{CrawlError, CrawlResult};
pub use page::{Context, Element, Request, Response};
pub use transport::{HttpTransport, Transport, TransportResponse};
