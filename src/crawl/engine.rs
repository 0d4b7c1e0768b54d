// src/crawl/engine.rs
// =============================================================================
// The crawl engine: discovers every same-site page reachable from a seed.
//
// How it works:
// 1. The seed is validated and becomes the root of the crawl (hop 0)
// 2. Each address runs as its own tokio task ("unit of work"):
//      claim it in History -> wait for a slot -> fetch -> report ->
//      extract links -> filter -> spawn a task per accepted link (hop + 1)
// 3. Every result (success or failure) goes into one shared queue that the
//    caller reads as a Stream
// 4. The stream ends once no task is left
//
// Completion tracking:
// - All tasks share one Arc<Shared>, and Shared owns the only sender of the
//   result queue. When the last task finishes, the Arc (and the sender) is
//   dropped and the receiver sees the end of the stream. The Arc strong count
//   *is* the number of outstanding units of work.
//
// Cancellation:
// - Checked when a task starts, while it waits for a slot, and before every
//   spawn. A fetch that is already running is not interrupted.
// - Dropping the CrawlStream has the same effect: emitting fails and tasks
//   stop spawning children.
//
// Rust concepts:
// - Arc: shared ownership of the crawl state across tasks
// - BoxFuture: a task that spawns copies of itself needs a named future type
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

use super::fetch::Fetcher;
use super::filter::{LinkFilter, SearchConfig};
use super::history::History;
use super::limiter::ConcurrencyLimiter;
use crate::error::{CrawlError, PageError};
use crate::links::LinkExtractor;

/// How a crawl behaves. Built once, never changed while crawling.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Pages fetched and parsed at the same time, 0 = unbounded
    pub max_concurrency: usize,
    pub search: SearchConfig,
    /// Links more than this many hops from the seed are not followed
    pub max_depth: Option<usize>,
}

/// What happened to one address.
#[derive(Debug)]
pub enum Outcome {
    /// Fetched successfully, `hops` link traversals away from the seed
    Visited { hops: usize },
    Failed(PageError),
}

/// One event of the result stream.
#[derive(Debug)]
pub struct SearchResult {
    pub url: String,
    pub outcome: Outcome,
}

impl SearchResult {
    fn visited(url: &Url, hops: usize) -> Self {
        Self {
            url: url.to_string(),
            outcome: Outcome::Visited { hops },
        }
    }

    fn failed(url: &Url, error: impl Into<PageError>) -> Self {
        Self {
            url: url.to_string(),
            outcome: Outcome::Failed(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Visited { .. })
    }

    pub fn hops(&self) -> Option<usize> {
        match self.outcome {
            Outcome::Visited { hops } => Some(hops),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PageError> {
        match &self.outcome {
            Outcome::Failed(error) => Some(error),
            Outcome::Visited { .. } => None,
        }
    }
}

/// Crawls websites with an injectable fetcher.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: CrawlOptions) -> Self {
        Self { fetcher, options }
    }

    /// Starts crawling from `seed` and returns the stream of results.
    ///
    /// Fails without doing any work if the seed is not an absolute http(s)
    /// URL with a hostname. Must be called from within a Tokio runtime.
    pub fn crawl(&self, seed: &str, cancel: CancellationToken) -> Result<CrawlStream, CrawlError> {
        let mut root = parse_seed(seed)?;
        root.set_fragment(None);

        let history = Arc::new(History::new());
        let (results, receiver) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            fetcher: Arc::clone(&self.fetcher),
            filter: LinkFilter::new(self.options.search.clone(), &root),
            history: Arc::clone(&history),
            limiter: ConcurrencyLimiter::new(self.options.max_concurrency),
            max_depth: self.options.max_depth,
            cancel,
            results,
        });

        info!(
            seed = %root,
            max_concurrency = self.options.max_concurrency,
            max_depth = ?self.options.max_depth,
            "starting crawl"
        );
        tokio::spawn(visit(shared, root, 0));

        Ok(CrawlStream { receiver, history })
    }
}

// Validates the seed: must parse, be http(s) and have a hostname
fn parse_seed(seed: &str) -> Result<Url, CrawlError> {
    let url = Url::parse(seed.trim()).map_err(|source| CrawlError::InvalidSeed {
        url: seed.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(CrawlError::UnsupportedScheme(seed.to_string()));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(CrawlError::MissingHost(seed.to_string())),
    }
}

/// Results of a running crawl. Ends once all work has drained.
pub struct CrawlStream {
    receiver: mpsc::UnboundedReceiver<SearchResult>,
    history: Arc<History>,
}

impl CrawlStream {
    /// Addresses claimed so far (all of them once the stream has ended).
    pub fn history(&self) -> &History {
        &self.history
    }
}

impl Stream for CrawlStream {
    type Item = SearchResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<SearchResult>> {
        self.receiver.poll_recv(cx)
    }
}

// State shared by every unit of work of one crawl
struct Shared {
    fetcher: Arc<dyn Fetcher>,
    filter: LinkFilter,
    history: Arc<History>,
    limiter: ConcurrencyLimiter,
    max_depth: Option<usize>,
    cancel: CancellationToken,
    results: mpsc::UnboundedSender<SearchResult>,
}

impl Shared {
    // False once nobody is listening anymore
    fn emit(&self, result: SearchResult) -> bool {
        self.results.send(result).is_ok()
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.results.is_closed()
    }

    // Parses a fetched page and spawns a unit of work for every accepted link
    //
    // Runs synchronously: the parsed DOM is not Send and must not be held
    // across an await point.
    fn expand(self: &Arc<Self>, page: &Url, body: &str, hops: usize) {
        let extractor = LinkExtractor::parse(body);
        let mut spawned = 0;

        for anchor in extractor.anchors() {
            let link = match anchor {
                Ok(link) => link,
                Err(e) => {
                    debug!(page = %page, error = %e, "malformed href");
                    if !self.emit(SearchResult::failed(page, e)) {
                        return;
                    }
                    continue;
                }
            };

            let next = match self.filter.accept(&link) {
                Ok(next) => next,
                Err(reason) => {
                    trace!(page = %page, href = %link.href, %reason, "link rejected");
                    continue;
                }
            };

            if self.max_depth.is_some_and(|max| hops + 1 > max) {
                trace!(page = %page, link = %next, "beyond max depth");
                continue;
            }

            if self.should_stop() {
                debug!(page = %page, "crawl stopped, not following further links");
                self.limiter.close();
                return;
            }

            tokio::spawn(visit(Arc::clone(self), next, hops + 1));
            spawned += 1;
        }

        debug!(page = %page, hops, spawned, "page expanded");
    }
}

// One unit of work: a single address at a known hop count
fn visit(shared: Arc<Shared>, url: Url, hops: usize) -> BoxFuture<'static, ()> {
    async move {
        if shared.should_stop() {
            return;
        }

        // Someone else already claimed this address
        if !shared.history.try_admit(url.as_str()) {
            return;
        }

        let _slot = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => {
                shared.limiter.close();
                return;
            }
            slot = shared.limiter.acquire() => match slot {
                Some(slot) => slot,
                None => return,
            },
        };

        trace!(url = %url, hops, "fetching");
        let page = match shared.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                debug!(url = %url, error = %e, "fetch failed");
                shared.emit(SearchResult::failed(&url, e));
                return;
            }
        };

        if !shared.emit(SearchResult::visited(&url, hops)) {
            return;
        }

        if page.was_redirected(&url) {
            debug!(url = %url, landed = %page.url, "redirected");
            // Links on a page outside the site are not part of it
            if !shared.filter.covers(&page.url) {
                debug!(url = %url, landed = %page.url, "redirected off-site, links not followed");
                return;
            }
        }

        shared.expand(&url, &page.body, hops);
    }
    .boxed()
}
