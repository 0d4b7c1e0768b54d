// src/sitemap/mod.rs
// =============================================================================
// Builds the sitemap file from the pages a crawl visited.
//
// Two output formats:
// - XML following the sitemaps.org protocol (<urlset><url><loc>...)
// - Plain text: every address separated by a single space
//
// Priority is derived from the hop count: the seed gets 1.0, a page N hops
// away gets 1/N (rounded to two decimals).
// =============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

pub const SITEMAP_NAMESPACE: &str = "https://www.sitemaps.org/schemas/sitemap/0.9/";

/// Output file flavour, chosen by the output path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapFormat {
    Xml,
    Plain,
}

impl SitemapFormat {
    /// `.xml` or `.txt`, case-insensitive. Anything else is `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xml" => Some(SitemapFormat::Xml),
            "txt" => Some(SitemapFormat::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<DateTime<Utc>>,
    pub priority: f64,
}

impl SitemapUrl {
    pub fn new(loc: impl Into<String>, hops: usize, lastmod: Option<DateTime<Utc>>) -> Self {
        Self {
            loc: loc.into(),
            lastmod,
            priority: priority_for(hops),
        }
    }
}

// 0 hops -> 1.0, 1 -> 1.0, 2 -> 0.5, 3 -> 0.33 ...
pub fn priority_for(hops: usize) -> f64 {
    if hops == 0 {
        return 1.0;
    }
    (100.0 / hops as f64).round() / 100.0
}

/// The <urlset> document.
#[derive(Debug, Default)]
pub struct UrlSet {
    urls: Vec<SitemapUrl>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from (address, hops) pairs, ordered by hops then address.
    pub fn from_pages<'a>(
        pages: impl IntoIterator<Item = (&'a str, usize)>,
        lastmod: Option<DateTime<Utc>>,
    ) -> Self {
        let mut pages: Vec<_> = pages.into_iter().collect();
        pages.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let mut set = Self::new();
        for (loc, hops) in pages {
            set.add(SitemapUrl::new(loc, hops, lastmod));
        }
        set
    }

    pub fn add(&mut self, url: SitemapUrl) {
        self.urls.push(url);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn write(&self, format: SitemapFormat, out: impl Write) -> Result<()> {
        match format {
            SitemapFormat::Xml => self.write_xml(out),
            SitemapFormat::Plain => self.write_plain(out),
        }
    }

    pub fn write_xml(&self, out: impl Write) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 4);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("failed to write XML declaration")?;
        writer
            .write_event(Event::Start(
                BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NAMESPACE)]),
            ))
            .context("failed to write <urlset>")?;

        for url in &self.urls {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            write_text_element(&mut writer, "loc", &url.loc)?;
            if let Some(lastmod) = url.lastmod {
                let stamp = lastmod.to_rfc3339_opts(SecondsFormat::Secs, true);
                write_text_element(&mut writer, "lastmod", &stamp)?;
            }
            write_text_element(&mut writer, "priority", &format!("{:.2}", url.priority))?;
            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("urlset")))
            .context("failed to close <urlset>")?;
        writer.into_inner().write_all(b"\n")?;
        Ok(())
    }

    pub fn write_plain(&self, mut out: impl Write) -> Result<()> {
        let listing = self
            .urls
            .iter()
            .map(|url| url.loc.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        out.write_all(listing.as_bytes())
            .context("failed to write sitemap listing")?;
        Ok(())
    }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> UrlSet {
        UrlSet::from_pages(
            [
                ("https://a.test/x", 1),
                ("https://a.test/", 0),
                ("https://a.test/x/y?a=1&b=2", 3),
            ],
            None,
        )
    }

    #[test]
    fn test_priority_from_hops() {
        assert_eq!(priority_for(0), 1.0);
        assert_eq!(priority_for(1), 1.0);
        assert_eq!(priority_for(2), 0.5);
        assert_eq!(priority_for(3), 0.33);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SitemapFormat::from_path(Path::new("out/map.xml")), Some(SitemapFormat::Xml));
        assert_eq!(SitemapFormat::from_path(Path::new("MAP.TXT")), Some(SitemapFormat::Plain));
        assert_eq!(SitemapFormat::from_path(Path::new("map.json")), None);
        assert_eq!(SitemapFormat::from_path(Path::new("map")), None);
    }

    #[test]
    fn test_plain_listing_is_space_separated_in_hop_order() {
        let mut out = Vec::new();
        sample().write_plain(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "https://a.test/ https://a.test/x https://a.test/x/y?a=1&b=2"
        );
    }

    #[test]
    fn test_xml_document() {
        let mut out = Vec::new();
        sample().write_xml(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="https://www.sitemaps.org/schemas/sitemap/0.9/">"#));
        assert!(xml.contains("<loc>https://a.test/</loc>"));
        assert!(xml.contains("<priority>1.00</priority>"));
        assert!(xml.contains("<priority>0.33</priority>"));
        // ampersands in query strings must be escaped
        assert!(xml.contains("<loc>https://a.test/x/y?a=1&amp;b=2</loc>"));
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(!xml.contains("<lastmod>"));
    }

    #[test]
    fn test_xml_lastmod() {
        let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let set = UrlSet::from_pages([("https://a.test/", 0)], Some(stamp));

        let mut out = Vec::new();
        set.write_xml(&mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains("<lastmod>2024-05-01T12:30:00Z</lastmod>"));
    }
}
