// src/links/extract.rs
// =============================================================================
// This module pulls hyperlinks out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, so broken markup never aborts parsing
//
// Every <a> element that carries an href becomes either:
// - a Link (display name + raw href + classification), or
// - a LinkParseError when the href cannot be parsed as a URL
//
// Anchors without an href are skipped silently.
//
// Rust concepts:
// - Iterators: links are produced lazily, one anchor at a time
// - Lifetimes: the iterators borrow the parsed document
// =============================================================================

use scraper::{ElementRef, Html};
use thiserror::Error;
use url::{ParseError, Url};

// Relative hrefs are validated by joining them onto this throwaway base.
const VALIDATION_BASE: &str = "http://relative.invalid/";

/// How an href relates to the page it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Carries its own hostname (`https://other.com/x`, `//cdn.host/x`)
    AbsoluteOffSite,
    /// No hostname: a path and/or query on the current site (`/about`, `docs?page=2`)
    RelativeSamePath,
    /// Only an in-page anchor (`#section`)
    Fragment,
    /// Anything we can't crawl: `mailto:`, `javascript:`, `tel:`, ...
    Undefined,
}

/// A hyperlink found in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Text of the anchor's first child when that child is a text node
    pub name: String,
    /// The href exactly as written (trimmed of surrounding whitespace)
    pub href: String,
    pub kind: LinkKind,
}

/// Raised for an anchor whose href is not a valid URL.
#[derive(Debug, Clone, Error)]
#[error("failed to parse href '{href}' of hyperlink {anchor}: {source}")]
pub struct LinkParseError {
    pub href: String,
    /// The offending <a> element rendered back to HTML
    pub anchor: String,
    #[source]
    pub source: ParseError,
}

// A parsed HTML document ready to hand out its links
//
// Parsing happens once in `parse`; `anchors`, `links` and `errors` walk the
// DOM lazily every time they are called.
pub struct LinkExtractor {
    document: Html,
}

impl LinkExtractor {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    // Every <a href> in document order, successful or not
    pub fn anchors(&self) -> impl Iterator<Item = Result<Link, LinkParseError>> + '_ {
        self.document
            .tree
            .root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| element.value().name() == "a")
            .filter_map(read_anchor)
    }

    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.anchors().filter_map(Result::ok)
    }

    pub fn errors(&self) -> impl Iterator<Item = LinkParseError> + '_ {
        self.anchors().filter_map(Result::err)
    }
}

// Turns one <a> element into a Link
// Returns None when there is no href, or only an empty one
fn read_anchor(element: ElementRef<'_>) -> Option<Result<Link, LinkParseError>> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let kind = match classify(href) {
        Ok(kind) => kind,
        Err(source) => {
            return Some(Err(LinkParseError {
                href: href.to_string(),
                anchor: element.html(),
                source,
            }))
        }
    };

    // Only a text node counts as the display name, <a><img ...></a> has none
    let name = element
        .first_child()
        .and_then(|child| child.value().as_text().map(|text| text.to_string()))
        .unwrap_or_default();

    Some(Ok(Link {
        name,
        href: href.to_string(),
        kind,
    }))
}

// Decides the LinkKind of a raw href
//
// Examples:
//   "https://other.com/x" -> AbsoluteOffSite
//   "//cdn.example.com/x" -> AbsoluteOffSite (protocol-relative)
//   "/about", "docs"      -> RelativeSamePath
//   "#top"                -> Fragment
//   "mailto:me@site.com"  -> Undefined
//   "http://[::1"         -> Err (malformed)
fn classify(href: &str) -> Result<LinkKind, ParseError> {
    match Url::parse(href) {
        Ok(url) if url.host_str().is_some() => Ok(LinkKind::AbsoluteOffSite),
        Ok(_) => Ok(LinkKind::Undefined),
        Err(ParseError::RelativeUrlWithoutBase) => {
            Url::parse(VALIDATION_BASE).and_then(|base| base.join(href))?;

            if href.starts_with("//") {
                return Ok(LinkKind::AbsoluteOffSite);
            }

            let path_len = href.find(|c| c == '?' || c == '#').unwrap_or(href.len());
            let fragment = href.split_once('#').map(|(_, fragment)| fragment).unwrap_or("");

            if path_len == 0 && !fragment.is_empty() {
                Ok(LinkKind::Fragment)
            } else {
                Ok(LinkKind::RelativeSamePath)
            }
        }
        Err(e) => Err(e),
    }
}
