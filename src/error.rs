// src/error.rs
// =============================================================================
// Error types shared across the crate.
//
// Two very different kinds of failure:
// - CrawlError: the crawl cannot start at all (bad seed URL). Fatal.
// - PageError: one address failed (download or a broken href). The crawl
//   reports it in the result stream and carries on with everything else.
// =============================================================================

use thiserror::Error;

use crate::crawl::FetchError;
use crate::links::LinkParseError;

/// Problems with the seed that stop a crawl before any work is spawned.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid target URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid target URL '{0}': hostname is required")]
    MissingHost(String),
    #[error("invalid target URL '{0}': scheme must be http or https")]
    UnsupportedScheme(String),
}

/// A non-fatal failure tied to a single address.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Link(#[from] LinkParseError),
}
