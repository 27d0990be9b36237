// src/transport/mock.rs
// =============================================================================
// An in-memory Transport for tests.
//
// Pages are registered by absolute URL. Every fetch is recorded with its
// headers so tests can count fetches per URL. Unknown URLs answer 404.
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use super::{Transport, TransportResponse};
use crate::error::{CrawlError, CrawlResult};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Failure {
    Fetch,
    Body,
}

#[derive(Debug, Clone)]
pub(crate) struct MockPage {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
    failure: Option<Failure>,
    delay: Option<Duration>,
}

impl MockPage {
    pub(crate) fn html(body: &str) -> Self {
        Self::with_type("text/html; charset=utf-8", body)
    }

    pub(crate) fn with_type(content_type: &str, body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.as_bytes().to_vec(),
            failure: None,
            delay: None,
        }
    }

    pub(crate) fn fetch_error() -> Self {
        Self {
            failure: Some(Failure::Fetch),
            ..Self::html("")
        }
    }

    pub(crate) fn body_error() -> Self {
        Self {
            failure: Some(Failure::Body),
            ..Self::html("")
        }
    }

    pub(crate) fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn not_found() -> Self {
        Self::with_type("text/plain", "not found").status(404)
    }
}

#[derive(Default)]
struct MockState {
    pages: Mutex<HashMap<String, MockPage>>,
    requests: Mutex<Vec<(String, HeaderMap)>>,
    cookies_disabled: AtomicBool,
}

/// Clones share pages and the request log.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(self, url: &str, page: MockPage) -> Self {
        self.state.pages.lock().unwrap().insert(url.to_string(), page);
        self
    }

    pub(crate) fn fetch_count(&self, url: &str) -> usize {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    pub(crate) fn total_fetches(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub(crate) fn headers_for(&self, url: &str) -> Option<HeaderMap> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, h)| h.clone())
    }

    pub(crate) fn cookies_disabled(&self) -> bool {
        self.state.cookies_disabled.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, CrawlResult<Box<dyn TransportResponse>>> {
        async move {
            self.state
                .requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.clone()));
            let page = self
                .state
                .pages
                .lock()
                .unwrap()
                .get(url.as_str())
                .cloned()
                .unwrap_or_else(MockPage::not_found);

            if let Some(delay) = page.delay {
                tokio::time::sleep(delay).await;
            }

            if page.failure == Some(Failure::Fetch) {
                return Err(CrawlError::Fetch {
                    url: url.to_string(),
                    source: "connection refused".into(),
                });
            }

            let mut response_headers = HeaderMap::new();
            if let Some(content_type) = &page.content_type {
                response_headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
            }

            Ok(Box::new(MockResponse {
                url: url.to_string(),
                headers: response_headers,
                page,
            }) as Box<dyn TransportResponse>)
        }
        .boxed()
    }

    fn disable_cookies(&self) {
        self.state.cookies_disabled.store(true, Ordering::SeqCst);
    }
}

struct MockResponse {
    url: String,
    headers: HeaderMap,
    page: MockPage,
}

impl TransportResponse for MockResponse {
    fn status(&self) -> u16 {
        self.page.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn read_body(self: Box<Self>) -> BoxFuture<'static, CrawlResult<Vec<u8>>> {
        let MockResponse { url, page, .. } = *self;

        async move {
            if page.failure == Some(Failure::Body) {
                return Err(CrawlError::Body {
                    url,
                    source: "connection reset mid-body".into(),
                });
            }
            Ok(page.body)
        }
        .boxed()
    }
}
