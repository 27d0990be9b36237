// src/collector/callbacks.rs
// =============================================================================
// The callback registry.
//
// Three kinds of callbacks, three collections:
// - request callbacks: a list, run in registration order before each fetch
// - response callbacks: a list, run in registration order after each fetch
// - html callbacks: a map from CSS selector to callback; registering the same
//   selector again replaces the old callback
//
// Dispatch never runs a callback while holding the registry lock. Each
// dispatch step copies the current callbacks out (they are Arcs, so that is
// cheap) and runs the copies. A callback is then free to register more
// callbacks or start child visits without deadlocking.
// =============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::page::{Element, Request, Response};

/// Runs before a request is sent. Can edit headers and the Context.
pub type RequestCallback = Arc<dyn Fn(&mut Request) + Send + Sync>;

/// Runs after a response body has been read.
pub type ResponseCallback = Arc<dyn Fn(&Response) + Send + Sync>;

/// Runs once for every node matching the selector it was registered with.
pub type HtmlCallback = Arc<dyn Fn(&Element<'_>) + Send + Sync>;

/// Any callback the collector can dispatch.
#[derive(Clone)]
pub enum Callback {
    Request(RequestCallback),
    Response(ResponseCallback),
    Html {
        selector: String,
        callback: HtmlCallback,
    },
}

impl Callback {
    pub fn request<F>(f: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        Callback::Request(Arc::new(f))
    }

    pub fn response<F>(f: F) -> Self
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        Callback::Response(Arc::new(f))
    }

    pub fn html<F>(selector: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Element<'_>) + Send + Sync + 'static,
    {
        Callback::Html {
            selector: selector.into(),
            callback: Arc::new(f),
        }
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callback::Request(_) => f.write_str("Callback::Request"),
            Callback::Response(_) => f.write_str("Callback::Response"),
            Callback::Html { selector, .. } => write!(f, "Callback::Html({:?})", selector),
        }
    }
}

#[derive(Default)]
struct Callbacks {
    request: Vec<RequestCallback>,
    response: Vec<ResponseCallback>,
    html: HashMap<String, HtmlCallback>,
}

#[derive(Default)]
pub(crate) struct Registry {
    inner: Mutex<Callbacks>,
}

impl Registry {
    pub(crate) fn register(&self, callback: Callback) {
        let mut callbacks = self.lock();
        match callback {
            Callback::Request(f) => callbacks.request.push(f),
            Callback::Response(f) => callbacks.response.push(f),
            Callback::Html { selector, callback } => {
                callbacks.html.insert(selector, callback);
            }
        }
    }

    pub(crate) fn request_callbacks(&self) -> Vec<RequestCallback> {
        self.lock().request.clone()
    }

    pub(crate) fn response_callbacks(&self) -> Vec<ResponseCallback> {
        self.lock().response.clone()
    }

    pub(crate) fn html_callbacks(&self) -> Vec<(String, HtmlCallback)> {
        self.lock()
            .html
            .iter()
            .map(|(selector, f)| (selector.clone(), Arc::clone(f)))
            .collect()
    }

    pub(crate) fn clear(&self) {
        *self.lock() = Callbacks::default();
    }

    fn lock(&self) -> MutexGuard<'_, Callbacks> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
