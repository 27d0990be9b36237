// src/collector/mod.rs
// =============================================================================
// The Collector: the crawl engine that ties everything together.
//
// How a fetch works (Shared::scrape):
// 1. Count the fetch as in flight (released on every way out)
// 2. Skip empty URLs
// 3. Skip URLs deeper than max_depth (0 = no limit)
// 4. Skip URLs already visited; otherwise claim the URL before fetching
// 5. Parse the URL
// 6. Build the Request (User-Agent header, fresh Context, depth)
// 7. Run request callbacks in registration order
// 8. Send it through the Transport
// 9. Read the whole body
// 10. Build the Response
// 11. If the Content-Type says HTML, run html callbacks per matched node
// 12. Run response callbacks in registration order
//
// Skips (2-4) return Ok(()). Failures in 5, 8 and 9 return an error and no
// callback after that point runs.
//
// Submodules:
// - callbacks: the callback registry
// - html: parsing a page and running html callbacks
// - in_flight: the counter behind Collector::wait
// - visited: the set of claimed URLs
//
// Rust concepts:
// - Arc<Shared>: one engine state, shared by every clone of the Collector
//   and by every task it spawns
// - tokio::spawn: child visits run as independent tasks
// =============================================================================

mod callbacks;
mod html;
mod in_flight;
mod visited;


pub use callbacks::{Callback, HtmlCallback, RequestCallback, ResponseCallback};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use url::Url;

use crate::config::CollectorConfig;
use crate::error::{CrawlError, CrawlResult};
use crate::page::{Element, Request, Response};
use crate::transport::{HttpTransport, Transport};
use callbacks::Registry;
use in_flight::{InFlight, InFlightGuard};
use visited::VisitedSet;

/// A crawl engine. Cloning is cheap and every clone drives the same crawl.
#[derive(Clone)]
pub struct Collector {
    shared: Arc<Shared>,
}

// Long-lived state, owned by the Collector and reachable from Requests
// through a Weak handle
pub(crate) struct Shared {
    settings: RwLock<Settings>,
    visited: VisitedSet,
    callbacks: Registry,
    in_flight: Arc<InFlight>,
    transport: RwLock<Arc<dyn Transport>>,
    // Runtime of the first visit; child visits started from plain threads
    // are spawned on it
    runtime: OnceLock<Handle>,
}

#[derive(Debug, Clone)]
struct Settings {
    user_agent: String,
    max_depth: usize,
}

impl From<&CollectorConfig> for Settings {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_depth: config.max_depth,
        }
    }
}

impl Collector {
    /// A collector with default settings: the crate's User-Agent, no depth
    /// limit and an HTTP transport with its own cookie jar.
    pub fn new() -> CrawlResult<Self> {
        Self::from_config(&CollectorConfig::default())
    }

    /// A collector configured from `config`.
    pub fn from_config(config: &CollectorConfig) -> CrawlResult<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::build(Settings::from(config), Arc::new(transport)))
    }

    /// A collector with default settings that fetches through `transport`.
    pub fn with_transport<T>(transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self::build(Settings::from(&CollectorConfig::default()), Arc::new(transport))
    }

    fn build(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings: RwLock::new(settings),
                visited: VisitedSet::default(),
                callbacks: Registry::default(),
                in_flight: Arc::new(InFlight::default()),
                transport: RwLock::new(transport),
                runtime: OnceLock::new(),
            }),
        }
    }

    // Non-owning handles go through here; see Request::collector
    pub(crate) fn upgrade(shared: &Weak<Shared>) -> Option<Self> {
        shared.upgrade().map(|shared| Self { shared })
    }

    /// Puts the collector back to its defaults: forgets visited URLs and
    /// callbacks, restores the default User-Agent and depth limit and starts
    /// a new HTTP transport with an empty cookie jar.
    ///
    /// Fetches already in flight keep running with what they captured.
    pub fn reset(&self) -> CrawlResult<()> {
        let transport = HttpTransport::new()?;
        self.reset_with_transport(transport);
        Ok(())
    }

    /// Like `reset`, but fetches through `transport` afterwards.
    pub fn reset_with_transport<T>(&self, transport: T)
    where
        T: Transport + 'static,
    {
        *write(&self.shared.settings) = Settings::from(&CollectorConfig::default());
        *write(&self.shared.transport) = Arc::new(transport);
        self.shared.visited.clear();
        self.shared.callbacks.clear();
        debug!("collector reset");
    }

    pub fn user_agent(&self) -> String {
        read(&self.shared.settings).user_agent.clone()
    }

    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        write(&self.shared.settings).user_agent = user_agent.into();
    }

    pub fn max_depth(&self) -> usize {
        read(&self.shared.settings).max_depth
    }

    /// Deepest level that will be fetched. The seed URL is depth 1; 0 turns
    /// the limit off.
    pub fn set_max_depth(&self, max_depth: usize) {
        write(&self.shared.settings).max_depth = max_depth;
    }

    /// Starts a crawl at `url` (depth 1) and runs the whole fetch pipeline
    /// for it.
    ///
    /// Returns Ok(()) without fetching when `url` is empty, already visited
    /// or beyond the depth limit. Returns an error when the URL does not
    /// parse or the transport fails.
    ///
    /// Child visits started by callbacks run as separate tasks; use `wait`
    /// to let them finish.
    pub async fn visit(&self, url: &str) -> CrawlResult<()> {
        if let Ok(runtime) = Handle::try_current() {
            let _ = self.shared.runtime.set(runtime);
        }
        let guard = self.shared.in_flight.enter();
        Shared::scrape(&self.shared, guard, url, 1).await
    }

    /// Registers a callback that runs before every request.
    pub fn on_request<F>(&self, f: F)
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.register(Callback::request(f));
    }

    /// Registers a callback that runs after every successfully read response.
    pub fn on_response<F>(&self, f: F)
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.register(Callback::response(f));
    }

    /// Registers a callback for every element matching `selector` in HTML
    /// responses. A later registration for the same selector replaces this one.
    pub fn on_html<F>(&self, selector: impl Into<String>, f: F)
    where
        F: Fn(&Element<'_>) + Send + Sync + 'static,
    {
        self.register(Callback::html(selector, f));
    }

    /// Registers any kind of callback.
    pub fn register(&self, callback: Callback) {
        trace!(?callback, "registering callback");
        self.shared.callbacks.register(callback);
    }

    /// Stops sending and storing cookies for all later requests.
    pub fn disable_cookies(&self) {
        read(&self.shared.transport).disable_cookies();
    }

    /// Resolves once no fetch is in flight, including child visits started
    /// while waiting.
    pub async fn wait(&self) {
        self.shared.in_flight.wait_idle().await;
    }

    pub fn has_visited(&self, url: &str) -> bool {
        self.shared.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.shared.visited.len()
    }

    /// Number of fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.count()
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let settings = read(&self.shared.settings);
        f.debug_struct("Collector")
            .field("user_agent", &settings.user_agent)
            .field("max_depth", &settings.max_depth)
            .field("visited", &self.shared.visited.len())
            .field("in_flight", &self.shared.in_flight.count())
            .finish()
    }
}

impl Shared {
    // The fetch pipeline shared by Collector::visit and Request::visit
    async fn scrape(
        this: &Arc<Self>,
        guard: InFlightGuard,
        url: &str,
        depth: usize,
    ) -> CrawlResult<()> {
        let _guard = guard;

        if url.is_empty() {
            return Ok(());
        }

        let settings = read(&this.settings).clone();
        if settings.max_depth > 0 && depth > settings.max_depth {
            trace!(url, depth, max_depth = settings.max_depth, "skipping: too deep");
            return Ok(());
        }

        if !this.visited.claim(url) {
            trace!(url, "skipping: already visited");
            return Ok(());
        }

        let parsed = Url::parse(url).map_err(|source| CrawlError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        let user_agent =
            HeaderValue::from_str(&settings.user_agent).map_err(|_| CrawlError::InvalidHeader {
                name: USER_AGENT.to_string(),
                value: settings.user_agent.clone(),
            })?;
        headers.insert(USER_AGENT, user_agent);

        let mut request = Request::new(parsed, headers, depth, Arc::downgrade(this));

        for f in this.callbacks.request_callbacks() {
            f(&mut request);
        }

        debug!(url = %request.url(), depth, "fetching");
        let transport = Arc::clone(&*read(&this.transport));
        let raw = transport.fetch(request.url(), request.headers()).await?;
        let status = raw.status();
        let response_headers = raw.headers().clone();
        let body = raw.read_body().await?;
        debug!(url = %request.url(), status, bytes = body.len(), "fetched");

        let response = Response::new(status, response_headers, body, request);

        // No selectors, no parsing
        let html_callbacks = this.callbacks.html_callbacks();
        if response.is_html() && !html_callbacks.is_empty() {
            html::dispatch(&response, &html_callbacks);
        }

        for f in this.callbacks.response_callbacks() {
            f(&response);
        }

        Ok(())
    }

    // Starts a child fetch as its own task. The in-flight slot is taken here,
    // before spawning, so a concurrent wait() cannot miss it.
    //
    // Callbacks may call this from threads of their own, which have no runtime
    // context; those children go to the runtime captured by the first visit
    pub(crate) fn spawn_visit(this: &Arc<Self>, url: String, depth: usize) -> ChildVisit {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => match this.runtime.get() {
                Some(runtime) => runtime.clone(),
                None => {
                    let reason = e.to_string();
                    return ChildVisit::failed(url.clone(), CrawlError::ChildTask { url, reason });
                }
            },
        };

        let guard = this.in_flight.enter();
        let shared = Arc::clone(this);
        let task_url = url.clone();

        let handle = runtime.spawn(async move {
            let result = Shared::scrape(&shared, guard, &task_url, depth).await;
            if let Err(e) = &result {
                warn!(url = %task_url, depth, error = %e, "child visit failed");
            }
            result
        });

        ChildVisit {
            url,
            state: ChildState::Running(handle),
        }
    }
}

/// Handle to a child visit started with `Request::visit`.
///
/// The fetch runs whether or not this handle is kept. `join` waits for it and
/// returns its result.
#[derive(Debug)]
pub struct ChildVisit {
    url: String,
    state: ChildState,
}

#[derive(Debug)]
enum ChildState {
    Running(JoinHandle<CrawlResult<()>>),
    Failed(CrawlError),
}

impl ChildVisit {
    pub(crate) fn failed(url: String, error: CrawlError) -> Self {
        Self {
            url,
            state: ChildState::Failed(error),
        }
    }

    /// The resolved URL of the child; empty when the link was an anchor or
    /// could not be resolved.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn join(self) -> CrawlResult<()> {
        match self.state {
            ChildState::Running(handle) => match handle.await {
                Ok(result) => result,
                Err(e) => Err(CrawlError::ChildTask {
                    url: self.url,
                    reason: e.to_string(),
                }),
            },
            ChildState::Failed(error) => Err(error),
        }
    }
}

// Settings and transport are replaced wholesale, so a poisoned lock still
// holds a consistent value
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
