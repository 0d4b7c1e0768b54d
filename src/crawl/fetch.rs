// src/crawl/fetch.rs
// =============================================================================
// This module downloads pages for the crawler.
//
// Key functionality:
// - The Fetcher trait: anything that can turn a URL into an HTML body
//   (tests plug in an in-memory fetcher, the CLI uses HttpFetcher)
// - HttpFetcher: a reqwest client that follows redirects by hand, so it can
//   report the whole redirect chain when something goes wrong
// - Any HTTP status >= 400, a redirect loop or a network error is a failure
//
// Rust concepts:
// - Traits + async-trait: an async method behind `dyn Fetcher`
// - Enums with data: each failure mode carries its own details
// =============================================================================

use async_trait::async_trait;
use reqwest::{header::LOCATION, redirect, Client, Response};
use std::time::Duration;
use thiserror::Error;
use tracing::trace;
use url::Url;

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Why a page could not be downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a 4xx or 5xx status
    #[error("HTTP {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        redirects: Vec<Url>,
    },
    /// More redirects than allowed (usually a loop)
    #[error("too many redirects ({} hops)", .redirects.len().saturating_sub(1))]
    TooManyRedirects { redirects: Vec<Url> },
    /// A 3xx response without a usable Location header
    #[error("HTTP {status} redirect without a valid Location header")]
    BrokenRedirect { status: u16, redirects: Vec<Url> },
    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),
    #[error("connection failed")]
    Connect(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    /// HTTP status of the failing response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } | FetchError::BrokenRedirect { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Every URL requested before giving up, starting with the original one.
    /// Empty for transport errors.
    pub fn redirect_chain(&self) -> &[Url] {
        match self {
            FetchError::Status { redirects, .. }
            | FetchError::TooManyRedirects { redirects }
            | FetchError::BrokenRedirect { redirects, .. } => redirects,
            _ => &[],
        }
    }

    // Sorts reqwest errors into the failure modes worth telling apart
    fn transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout(error)
        } else if error.is_connect() {
            FetchError::Connect(error)
        } else {
            FetchError::Http(error)
        }
    }
}

/// A downloaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Where the body actually came from, after any redirects
    pub url: Url,
    pub body: String,
}

impl FetchedPage {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// True when the server sent us somewhere else than `requested`.
    pub fn was_redirected(&self, requested: &Url) -> bool {
        self.url != *requested
    }
}

/// Retrieves the HTML body of a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Settings for the default HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: concat!("sitemapper/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// Fetcher backed by a shared reqwest client
//
// The client is cheap to clone internally (it's an Arc), and reusing one
// client gives us connection pooling across every page of the crawl.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        // Redirects are followed in `fetch` so the chain can be reported
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut redirects = vec![url.clone()];
        let mut current = url.clone();

        loop {
            let response = self
                .client
                .get(current.as_str())
                .send()
                .await
                .map_err(FetchError::transport)?;
            let status = response.status();

            if status.is_redirection() {
                let Some(next) = redirect_target(&response, &current) else {
                    return Err(FetchError::BrokenRedirect {
                        status: status.as_u16(),
                        redirects,
                    });
                };
                trace!(from = %current, to = %next, status = status.as_u16(), "following redirect");

                redirects.push(next.clone());
                if redirects.len() - 1 > self.max_redirects {
                    return Err(FetchError::TooManyRedirects { redirects });
                }
                current = next;
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("").to_string(),
                    redirects,
                });
            }

            let body = response.text().await.map_err(FetchError::transport)?;
            return Ok(FetchedPage::new(current, body));
        }
    }
}

// Resolves the Location header of a redirect against the URL that produced it
fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(FetchConfig::default()).unwrap()
    }

    fn url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&server)
            .await;

        let page = fetcher().fetch(&url(&server, "/page")).await.unwrap();
        assert_eq!(page.body, "<a href=\"/x\">x</a>");
        assert_eq!(page.url, url(&server, "/page"));
        assert!(!page.was_redirected(&url(&server, "/page")));
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&url(&server, "/missing")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert_eq!(err.redirect_chain(), &[url(&server, "/missing")]);
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let page = fetcher().fetch(&url(&server, "/old")).await.unwrap();
        assert_eq!(page.body, "moved");
        assert_eq!(page.url, url(&server, "/new"));
        assert!(page.was_redirected(&url(&server, "/old")));
    }

    #[tokio::test]
    async fn test_redirect_loop_reports_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&url(&server, "/loop")).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects { .. }));
        // the original request plus one more than the allowed redirects
        assert_eq!(err.redirect_chain().len(), DEFAULT_MAX_REDIRECTS + 2);
        assert_eq!(err.to_string(), "too many redirects (11 hops)");
    }

    #[tokio::test]
    async fn test_redirect_without_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nowhere"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&url(&server, "/nowhere")).await.unwrap_err();
        assert!(matches!(err, FetchError::BrokenRedirect { status: 302, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let err = fetcher()
            .fetch(&Url::parse("http://127.0.0.1:9/").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), None);
        assert!(err.redirect_chain().is_empty());
    }
}
