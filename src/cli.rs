// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Everything the user types is turned into plain configuration values here
// (CrawlOptions, FetchConfig, the output file) before the crawl starts.
// Nothing is changed once crawling has begun.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct
// - ValueEnum: a fixed set of accepted words for --search
// - value_parser: custom validation of --output
// =============================================================================

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;

use crate::crawl::{CrawlOptions, FetchConfig, SearchConfig, DEFAULT_MAX_REDIRECTS};
use crate::sitemap::SitemapFormat;

#[derive(Parser, Debug)]
#[command(
    name = "sitemapper",
    version,
    about = "Crawl a website from a starting URL and write a sitemap of every page on it",
    long_about = "sitemapper follows every same-site link reachable from the target URL, \
                  visiting each page once, and writes the pages it found as a sitemap \
                  (.xml following sitemaps.org, or a plain .txt listing)."
)]
pub struct Cli {
    /// URL to start crawling from (e.g., https://example.com)
    #[arg(short = 't', long = "target")]
    pub target: String,

    /// Output file, must end in .xml or .txt
    #[arg(short = 'o', long = "output", value_parser = parse_output)]
    pub output: SitemapOutput,

    /// Maximum number of pages fetched at the same time (0 = unlimited)
    #[arg(long = "mr", visible_alias = "max-concurrency", default_value_t = 0)]
    pub max_concurrency: usize,

    /// Comma-separated search options
    ///
    /// Example: --search includeSubdomains,includeWithQuery
    #[arg(short = 's', long = "search", value_enum, value_delimiter = ',')]
    pub search: Vec<SearchOption>,

    /// Skip every URL matching this regular expression (repeatable)
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Vec<String>,

    /// Don't follow links more than this many hops away from the target
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Redirects followed before a page counts as failed
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
    pub max_redirects: usize,

    /// Also write log output to this file
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Print a JSON report on stdout when done
    #[arg(long)]
    pub json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// No progress display
    #[arg(short, long)]
    pub quiet: bool,
}

/// Words accepted by `--search`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOption {
    /// Treat example.com and example.org as the same site
    #[value(name = "ignoreTopLevelDomain")]
    IgnoreTopLevelDomain,
    /// Follow links that carry a query string
    #[value(name = "includeWithQuery")]
    IncludeWithQuery,
    /// Follow links to subdomains of the target host
    #[value(name = "includeSubdomains")]
    IncludeSubdomains,
}

/// Where to write the sitemap and in which format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapOutput {
    pub path: PathBuf,
    pub format: SitemapFormat,
}

impl SitemapOutput {
    // Opens (truncating) the output file, creating missing parent directories
    pub fn create(&self) -> Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("cannot create {}", self.path.display()))?;
        Ok(BufWriter::new(file))
    }
}

fn parse_output(value: &str) -> Result<SitemapOutput, String> {
    let path = PathBuf::from(value);
    match SitemapFormat::from_path(&path) {
        Some(format) => Ok(SitemapOutput { path, format }),
        None => Err("output file type must be one of these: XML, TXT".to_string()),
    }
}

impl Cli {
    // Builds the crawl configuration; fails on an invalid --exclude pattern
    pub fn crawl_options(&self) -> Result<CrawlOptions> {
        let excluded_patterns = self
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).with_context(|| format!("invalid --exclude pattern '{}'", pattern))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CrawlOptions {
            max_concurrency: self.max_concurrency,
            search: SearchConfig {
                include_subdomains: self.search.contains(&SearchOption::IncludeSubdomains),
                ignore_top_level_domain: self.search.contains(&SearchOption::IgnoreTopLevelDomain),
                include_links_with_query: self.search.contains(&SearchOption::IncludeWithQuery),
                excluded_patterns,
            },
            max_depth: self.max_depth,
        })
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.timeout),
            max_redirects: self.max_redirects,
            ..FetchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sitemapper").chain(args.iter().copied()))
    }

    #[test]
    fn test_minimal_flags() {
        let cli = parse(&["-t", "https://example.com", "-o", "map.xml"]).unwrap();
        assert_eq!(cli.target, "https://example.com");
        assert_eq!(cli.output.format, SitemapFormat::Xml);
        assert_eq!(cli.max_concurrency, 0);

        let options = cli.crawl_options().unwrap();
        assert!(!options.search.include_subdomains);
        assert!(!options.search.ignore_top_level_domain);
        assert!(!options.search.include_links_with_query);
        assert_eq!(options.max_depth, None);
    }

    #[test]
    fn test_search_options_are_comma_separated() {
        let cli = parse(&[
            "-t",
            "https://example.com",
            "-o",
            "map.txt",
            "--mr",
            "8",
            "-s",
            "includeSubdomains,includeWithQuery",
        ])
        .unwrap();

        assert_eq!(cli.output.format, SitemapFormat::Plain);
        let options = cli.crawl_options().unwrap();
        assert_eq!(options.max_concurrency, 8);
        assert!(options.search.include_subdomains);
        assert!(options.search.include_links_with_query);
        assert!(!options.search.ignore_top_level_domain);
    }

    #[test]
    fn test_bad_output_extension_rejected() {
        assert!(parse(&["-t", "https://example.com", "-o", "map.json"]).is_err());
        assert!(parse(&["-t", "https://example.com", "-o", "map"]).is_err());
    }

    #[test]
    fn test_unknown_search_option_rejected() {
        assert!(parse(&["-t", "https://example.com", "-o", "m.xml", "-s", "followEverything"]).is_err());
    }

    #[test]
    fn test_exclude_patterns_compiled() {
        let cli = parse(&["-t", "https://e.com", "-o", "m.xml", "-x", "/admin/", "-x", r"\.pdf$"]).unwrap();
        let options = cli.crawl_options().unwrap();
        assert_eq!(options.search.excluded_patterns.len(), 2);

        let cli = parse(&["-t", "https://e.com", "-o", "m.xml", "-x", "(unclosed"]).unwrap();
        assert!(cli.crawl_options().is_err());
    }

    #[test]
    fn test_output_file_is_created_up_front() {
        let dir = std::env::temp_dir().join(format!("sitemapper-cli-{}", std::process::id()));
        let target = dir.join("nested").join("map.xml");
        let cli = parse(&["-t", "https://e.com", "-o", target.to_str().unwrap()]).unwrap();

        cli.output.create().unwrap();
        assert!(target.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let blocker = std::env::temp_dir().join(format!("sitemapper-blocker-{}", std::process::id()));
        std::fs::write(&blocker, "not a directory").unwrap();
        let target = blocker.join("map.xml");
        let cli = parse(&["-t", "https://e.com", "-o", target.to_str().unwrap()]).unwrap();

        let err = cli.output.create().unwrap_err();
        assert!(format!("{:#}", err).contains("cannot create"));
        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn test_fetch_config_from_flags() {
        let cli = parse(&["-t", "https://e.com", "-o", "m.xml", "--timeout", "3", "--max-redirects", "2"]).unwrap();
        let config = cli.fetch_config();
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_redirects, 2);
    }
}
