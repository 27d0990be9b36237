// src/collector/html.rs
// =============================================================================
// Runs html callbacks against a fetched page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM, always producing some tree even for broken markup
// - Supports CSS selectors for finding elements
// - Returns matches in document order
//
// A selector that does not parse is skipped with a warning and the fetch
// carries on. Bad markup or a bad selector should not cost the caller the
// response callbacks.
//
// scraper's Html type is not Send, so everything here is synchronous and the
// document never lives across an .await in the fetch task.
// =============================================================================

use scraper::{Html, Selector};
use tracing::{trace, warn};

use super::callbacks::HtmlCallback;
use crate::page::{Element, Response};

// Parses the response body once and runs every selector against it
//
// Returns the number of callback invocations, mostly for logging
pub(crate) fn dispatch(response: &Response, callbacks: &[(String, HtmlCallback)]) -> usize {
    let body = String::from_utf8_lossy(response.body());
    let document = Html::parse_document(&body);
    let mut calls = 0;

    for (expr, callback) in callbacks {
        let selector = match Selector::parse(expr) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(selector = %expr, error = ?e, "skipping selector that does not parse");
                continue;
            }
        };

        for node in document.select(&selector) {
            let element = Element::from_node(node, response);
            callback(&element);
            calls += 1;
        }
    }

    trace!(url = %response.request().url(), calls, "html callbacks done");
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use std::sync::{Arc, Mutex, Weak};
    use url::Url;

    use crate::page::Request;

    fn page(body: &[u8]) -> Response {
        let request = Request::new(
            Url::parse("http://a.test/").unwrap(),
            HeaderMap::new(),
            1,
            Weak::new(),
        );
        Response::new(200, HeaderMap::new(), body.to_vec(), request)
    }

    fn callback<F>(f: F) -> HtmlCallback
    where
        F: Fn(&Element<'_>) + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn recorder(seen: &Arc<Mutex<Vec<String>>>, key: &'static str) -> HtmlCallback {
        let seen = Arc::clone(seen);
        callback(move |e| seen.lock().unwrap().push(e.attr(key).to_string()))
    }

    #[test]
    fn test_matches_in_document_order() {
        let response = page(
            br#"<a href="/one">1</a><p><a href="/two">2</a></p><a>no href</a><a href="/three">3</a>"#,
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callbacks = vec![("a[href]".to_string(), recorder(&seen, "href"))];

        assert_eq!(dispatch(&response, &callbacks), 3);
        assert_eq!(*seen.lock().unwrap(), vec!["/one", "/two", "/three"]);
    }

    #[test]
    fn test_bad_selector_is_skipped() {
        let response = page(br#"<img src="/x.png">"#);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callbacks = vec![
            ("a[[".to_string(), recorder(&seen, "href")),
            ("img".to_string(), recorder(&seen, "src")),
        ];

        assert_eq!(dispatch(&response, &callbacks), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["/x.png"]);
    }

    #[test]
    fn test_broken_markup_and_binary_body() {
        let response = page(b"<div><a href='/ok'>unclosed <b>tags");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callbacks = vec![("a".to_string(), recorder(&seen, "href"))];
        assert_eq!(dispatch(&response, &callbacks), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["/ok"]);

        let binary = page(&[0xff, 0xfe, 0x00, 0x01]);
        assert_eq!(dispatch(&binary, &callbacks), 0);
    }
}
