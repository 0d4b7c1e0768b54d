// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Concurrent traversal, one tokio task per discovered page
// - Same-site policy with optional subdomains / other top-level domains
// - Each address is fetched at most once per crawl
// - Optional cap on simultaneous fetches and on hop depth
//
// Submodules:
// - engine: orchestrates a crawl and streams the results
// - filter: decides which links are followed
// - history: the visited set
// - limiter: the fetch slot pool
// - fetch: downloading pages
// =============================================================================

mod engine;
mod fetch;
mod filter;
mod history;
mod limiter;

pub use engine::{CrawlOptions, CrawlStream, Crawler, Outcome, SearchResult};
pub use fetch::{FetchConfig, FetchError, FetchedPage, Fetcher, HttpFetcher, DEFAULT_MAX_REDIRECTS};
pub use filter::{LinkFilter, Rejection, SearchConfig};
pub use history::History;
pub use limiter::{ConcurrencyLimiter, Slot};
