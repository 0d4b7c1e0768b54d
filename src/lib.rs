// src/lib.rs
// =============================================================================
// sitemapper: discover every page of a website and write a sitemap.
//
// Modules:
// - links:    hyperlink extraction from HTML
// - crawl:    the concurrent crawl engine and its parts
// - sitemap:  XML / plain-text sitemap output
// - report:   collected results and their presentation
// - progress: live counters while crawling
// - cli, logging: the command-line front end
// =============================================================================

pub mod cli;
pub mod crawl;
pub mod error;
pub mod links;
pub mod logging;
pub mod progress;
pub mod report;
pub mod sitemap;

pub use crawl::{CrawlOptions, CrawlStream, Crawler, Outcome, SearchConfig, SearchResult};
pub use error::{CrawlError, PageError};
