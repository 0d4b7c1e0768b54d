// src/crawl/filter.rs
// =============================================================================
// This module decides which discovered links the crawler should follow.
//
// The rules run in a fixed order and the first failing one rejects the link:
// 1. In-page anchors (#section) and uncrawlable schemes are dropped
// 2. The link is resolved to an absolute URL (relative ones against the root)
// 3. Excluded-path patterns are checked against the full URL
// 4. URLs with a query string are dropped unless explicitly allowed
// 5. The host must be "same-site" with the root host
//
// Nothing in here does I/O; it is a pure function of the link, the search
// configuration and the root URL.
// =============================================================================

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::links::{Link, LinkKind};

/// Link acceptance criteria, fixed for one crawl.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Follow links to subdomains of the root host (blog.example.com)
    pub include_subdomains: bool,
    /// Treat example.com and example.org as the same site
    pub ignore_top_level_domain: bool,
    /// Follow URLs carrying a query string (off by default)
    pub include_links_with_query: bool,
    /// Any URL matching one of these is skipped
    pub excluded_patterns: Vec<Regex>,
}

/// Why a link was not followed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("in-page fragment")]
    Fragment,
    #[error("not a crawlable link")]
    Undefined,
    #[error("cannot be resolved against the root URL")]
    Unresolvable,
    #[error("not an http(s) URL")]
    Scheme,
    #[error("matches excluded pattern '{0}'")]
    Excluded(String),
    #[error("carries a query string")]
    Query,
    #[error("host '{0}' is not part of the site")]
    OffSite(String),
}

// Applies a SearchConfig relative to the crawl's root URL
#[derive(Debug, Clone)]
pub struct LinkFilter {
    config: SearchConfig,
    // scheme://authority/ of the root, relative links are resolved against it
    origin: Url,
    root_host: String,
}

impl LinkFilter {
    // The root must have a host; Crawler::crawl checks this before building the filter
    pub fn new(config: SearchConfig, root: &Url) -> Self {
        let mut origin = root.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Self {
            config,
            root_host: root.host_str().unwrap_or_default().to_string(),
            origin,
        }
    }

    // Returns the canonical URL to visit, or the reason the link was dropped
    //
    // Examples with root https://example.com and the default config:
    //   "#section"                    -> Err(Fragment)
    //   "/about"                      -> Ok(https://example.com/about)
    //   "https://example.com/about?x" -> Err(Query)
    //   "https://other.com/"          -> Err(OffSite)
    pub fn accept(&self, link: &Link) -> Result<Url, Rejection> {
        let mut resolved = match link.kind {
            LinkKind::Fragment => return Err(Rejection::Fragment),
            LinkKind::Undefined => return Err(Rejection::Undefined),
            // Url::join keeps absolute hrefs as they are and gives
            // protocol-relative ones the root's scheme
            LinkKind::RelativeSamePath | LinkKind::AbsoluteOffSite => self
                .origin
                .join(&link.href)
                .map_err(|_| Rejection::Unresolvable)?,
        };
        // The fragment never reaches the server, so it is not part of the address
        resolved.set_fragment(None);

        let address = resolved.as_str();
        if address.is_empty() || address.starts_with('.') {
            return Err(Rejection::Unresolvable);
        }
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return Err(Rejection::Scheme);
        }

        if let Some(pattern) = self
            .config
            .excluded_patterns
            .iter()
            .find(|pattern| pattern.is_match(address))
        {
            return Err(Rejection::Excluded(pattern.as_str().to_string()));
        }

        if !self.config.include_links_with_query && resolved.query().is_some() {
            return Err(Rejection::Query);
        }

        let host = resolved.host_str().unwrap_or_default();
        if !self.is_same_site(host) {
            return Err(Rejection::OffSite(host.to_string()));
        }

        Ok(resolved)
    }

    // True when `url` belongs to the crawled site under the same host rules as
    // `accept`; used for pages a redirect moved somewhere else
    pub fn covers(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| self.is_same_site(host))
    }

    fn is_same_site(&self, host: &str) -> bool {
        let (mut candidate, mut root) = (host, self.root_host.as_str());
        if self.config.ignore_top_level_domain {
            candidate = trim_top_level_domain(candidate);
            root = trim_top_level_domain(root);
        }

        if self.config.include_subdomains {
            is_subdomain(root, candidate)
        } else {
            candidate == root
        }
    }
}

// "www.example.com" -> "www.example", "localhost" -> ""
fn trim_top_level_domain(host: &str) -> &str {
    host.rsplit_once('.').map(|(rest, _)| rest).unwrap_or("")
}

// True when `candidate` is `domain` itself or one of its subdomains,
// ignoring a leading "www." on either side
fn is_subdomain(domain: &str, candidate: &str) -> bool {
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    let candidate = candidate.strip_prefix("www.").unwrap_or(candidate);

    candidate == domain
        || candidate
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
