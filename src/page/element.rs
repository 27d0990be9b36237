// src/page/element.rs
// =============================================================================
// An Element is one HTML node matched by a selector registered with
// `Collector::on_html`.
//
// The node is copied out of the parsed document (tag name, attributes, text)
// so the callback never has to deal with the `scraper` DOM directly. The
// Element borrows the Response it came from, which also gives access to the
// Request (and through it `request.visit(...)` for following links).
// =============================================================================

use scraper::ElementRef;

use super::{Request, Response};

#[derive(Debug)]
pub struct Element<'a> {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    response: &'a Response,
}

impl<'a> Element<'a> {
    pub(crate) fn new(
        name: impl Into<String>,
        attributes: Vec<(String, String)>,
        text: impl Into<String>,
        response: &'a Response,
    ) -> Self {
        Self {
            name: name.into(),
            attributes,
            text: text.into(),
            response,
        }
    }

    // Copies what we need out of a matched DOM node
    pub(crate) fn from_node(node: ElementRef<'_>, response: &'a Response) -> Self {
        let value = node.value();
        let attributes = value
            .attrs()
            .map(|(key, val)| (key.to_string(), val.to_string()))
            .collect();
        let text: String = node.text().collect();

        Self::new(value.name(), attributes, text, response)
    }

    /// The tag name, e.g. "a" or "img".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of attribute `key`, or "" when the node has no such
    /// attribute. The match is exact and case-sensitive.
    pub fn attr(&self, key: &str) -> &str {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Text content of the node and all of its descendants.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn request(&self) -> &'a Request {
        self.response.request()
    }

    pub fn response(&self) -> &'a Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use scraper::{Html, Selector};
    use std::sync::Weak;
    use url::Url;

    fn response() -> Response {
        let request = Request::new(
            Url::parse("http://a.test/").unwrap(),
            HeaderMap::new(),
            1,
            Weak::new(),
        );
        Response::new(200, HeaderMap::new(), Vec::new(), request)
    }

    #[test]
    fn test_attr_lookup() {
        let resp = response();
        let element = Element::new(
            "a",
            vec![
                ("href".to_string(), "/b".to_string()),
                ("data-x".to_string(), "1".to_string()),
            ],
            "B",
            &resp,
        );
        assert_eq!(element.attr("href"), "/b");
        assert_eq!(element.attr("missing"), "");
        // exact match only
        assert_eq!(element.attr("HREF"), "");
        assert_eq!(element.name(), "a");
        assert_eq!(element.request().url().as_str(), "http://a.test/");
    }

    #[test]
    fn test_from_node_copies_name_attrs_and_text() {
        let resp = response();
        let document =
            Html::parse_document(r#"<p><a href="/docs" title="Docs">Read <b>the</b> docs</a></p>"#);
        let selector = Selector::parse("a").unwrap();
        let node = document.select(&selector).next().unwrap();

        let element = Element::from_node(node, &resp);
        assert_eq!(element.name(), "a");
        assert_eq!(element.attr("href"), "/docs");
        assert_eq!(element.attr("title"), "Docs");
        assert_eq!(element.text(), "Read the docs");
        assert_eq!(element.attributes().len(), 2);
    }
}
