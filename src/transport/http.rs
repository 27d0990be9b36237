// src/transport/http.rs
// =============================================================================
// The default Transport, backed by reqwest.
//
// Key functionality:
// - One reqwest Client per transport, reused for every request (connection
//   pooling comes for free)
// - A cookie jar attached to that client, so a crawl behaves like one browser
//   session
// - disable_cookies() switches to a second client built without the jar
// - Optional per-request timeout and a redirect limit from CollectorConfig
//
// reqwest clients are immutable once built, so "detaching" the jar means
// swapping which client we use. Both are built up front; switching can then
// never fail.
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Transport, TransportResponse};
use crate::config::CollectorConfig;
use crate::error::{CrawlError, CrawlResult};

pub struct HttpTransport {
    with_cookies: Client,
    without_cookies: Client,
    cookies_enabled: AtomicBool,
}

impl HttpTransport {
    /// A transport with a fresh cookie jar, reqwest's default timeouts and a
    /// limit of 10 redirects.
    pub fn new() -> CrawlResult<Self> {
        Self::from_config(&CollectorConfig::default())
    }

    pub fn from_config(config: &CollectorConfig) -> CrawlResult<Self> {
        let timeout = config.timeout();
        let jar = Arc::new(Jar::default());

        let transport = Self {
            with_cookies: build_client(timeout, config.max_redirects, Some(jar))?,
            without_cookies: build_client(timeout, config.max_redirects, None)?,
            cookies_enabled: AtomicBool::new(true),
        };

        if !config.cookies {
            transport.disable_cookies();
        }

        Ok(transport)
    }

    pub fn cookies_enabled(&self) -> bool {
        self.cookies_enabled.load(Ordering::SeqCst)
    }

    fn client(&self) -> &Client {
        if self.cookies_enabled() {
            &self.with_cookies
        } else {
            &self.without_cookies
        }
    }
}

// Builds a reqwest client with the crawl's timeout and redirect settings
fn build_client(timeout: Option<Duration>, max_redirects: usize, jar: Option<Arc<Jar>>) -> CrawlResult<Client> {
    let mut builder = Client::builder().redirect(reqwest::redirect::Policy::limited(max_redirects));

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }

    builder.build().map_err(CrawlError::Client)
}

impl Transport for HttpTransport {
    fn fetch<'a>(
        &'a self,
        url: &'a Url,
        headers: &'a HeaderMap,
    ) -> BoxFuture<'a, CrawlResult<Box<dyn TransportResponse>>> {
        let request = self.client().get(url.clone()).headers(headers.clone());

        async move {
            let response = request.send().await.map_err(|e| {
                debug!(url = %url, kind = failure_kind(&e), "transport request failed");
                CrawlError::Fetch {
                    url: url.to_string(),
                    source: Box::new(e),
                }
            })?;

            Ok(Box::new(HttpResponse {
                url: url.to_string(),
                status: response.status().as_u16(),
                headers: response.headers().clone(),
                inner: response,
            }) as Box<dyn TransportResponse>)
        }
        .boxed()
    }

    fn disable_cookies(&self) {
        if self.cookies_enabled.swap(false, Ordering::SeqCst) {
            debug!("cookie jar detached from HTTP transport");
        }
    }
}

struct HttpResponse {
    url: String,
    status: u16,
    headers: HeaderMap,
    inner: reqwest::Response,
}

impl TransportResponse for HttpResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn read_body(self: Box<Self>) -> BoxFuture<'static, CrawlResult<Vec<u8>>> {
        let HttpResponse { url, inner, .. } = *self;

        async move {
            inner
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|e| CrawlError::Body {
                    url,
                    source: Box::new(e),
                })
        }
        .boxed()
    }
}

// Short label for a reqwest failure, used in log output
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - Too many redirects
// - Connection refused / DNS failure
// - Anything else (TLS, invalid response, ...)
fn failure_kind(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_redirect() {
        "too_many_redirects"
    } else if error.is_connect() {
        "connect"
    } else {
        "other"
    }
}
