// src/page/response.rs
// =============================================================================
// A Response is a completed fetch: status, headers, the whole body, and the
// Request that produced it. The Response owns its Request, so the Context the
// pre-request callbacks filled in is reachable from here as well.
// =============================================================================

use reqwest::header::{HeaderMap, CONTENT_TYPE};

use super::{Context, Request};

#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    request: Request,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Vec<u8>, request: Request) -> Self {
        Self {
            status,
            headers,
            body,
            request,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The Context shared with the originating Request.
    pub fn ctx(&self) -> &Context {
        self.request.ctx()
    }

    /// The declared Content-Type, if it is present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// True when the Content-Type mentions "html" in any letter case.
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false)
    }
}
