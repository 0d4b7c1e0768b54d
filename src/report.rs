// src/report.rs
// =============================================================================
// Collects the outcome of a crawl and prints it.
//
// Two presentations:
// - A human-readable summary table on stderr
// - JSON on stdout (--json), for scripts and CI pipelines
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::crawl::{Outcome, SearchResult};
use crate::error::PageError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VisitedPage {
    pub url: String,
    pub hops: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedPage {
    pub url: String,
    pub error: String,
    /// HTTP status when the server answered with one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub target: String,
    pub visited: Vec<VisitedPage>,
    pub failed: Vec<FailedPage>,
    pub interrupted: bool,
    pub elapsed_secs: f64,
}

impl CrawlReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            visited: Vec::new(),
            failed: Vec::new(),
            interrupted: false,
            elapsed_secs: 0.0,
        }
    }

    // Takes ownership of a result; the error is flattened to its message
    pub fn record(&mut self, result: SearchResult) {
        match result.outcome {
            Outcome::Visited { hops } => self.visited.push(VisitedPage { url: result.url, hops }),
            Outcome::Failed(error) => {
                let status = match &error {
                    PageError::Fetch(e) => e.status(),
                    PageError::Link(_) => None,
                };
                self.failed.push(FailedPage {
                    url: result.url,
                    error: error.to_string(),
                    status,
                });
            }
        }
    }

    pub fn max_hops(&self) -> usize {
        self.visited.iter().map(|page| page.hops).max().unwrap_or(0)
    }

    /// (address, hops) pairs for the sitemap builder.
    pub fn pages(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.visited.iter().map(|page| (page.url.as_str(), page.hops))
    }
}

// Prints the report either as a table or JSON
pub fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_summary(report);
    }
    Ok(())
}

fn print_summary(report: &CrawlReport) {
    if !report.failed.is_empty() {
        eprintln!("{:<60} {:<40}", "URL", "ERROR");
        eprintln!("{}", "=".repeat(100));
        for failure in &report.failed {
            eprintln!("{:<60} {:<40}", truncate(&failure.url, 57), failure.error);
        }
        eprintln!();
    }

    eprintln!("📊 Summary for {}:", report.target);
    eprintln!("   ✅ Pages: {}", report.visited.len());
    eprintln!("   ❌ Errors: {}", report.failed.len());
    eprintln!("   🔗 Deepest page: {} hop(s) from the start", report.max_hops());
    eprintln!("   ⏱️  Time: {:.2}s", report.elapsed_secs);
    if report.interrupted {
        eprintln!("   ⚠️  Crawl was interrupted, the sitemap is incomplete");
    }
}

// Shortens long URLs for the table, respecting char boundaries
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::FetchError;

    #[test]
    fn test_record_splits_visits_and_failures() {
        let mut report = CrawlReport::new("https://a.test/");
        report.record(SearchResult {
            url: "https://a.test/".to_string(),
            outcome: Outcome::Visited { hops: 0 },
        });
        report.record(SearchResult {
            url: "https://a.test/deep".to_string(),
            outcome: Outcome::Visited { hops: 3 },
        });
        report.record(SearchResult {
            url: "https://a.test/gone".to_string(),
            outcome: Outcome::Failed(PageError::Fetch(FetchError::Status {
                status: 410,
                reason: "Gone".to_string(),
                redirects: vec![],
            })),
        });

        assert_eq!(report.visited.len(), 2);
        assert_eq!(report.max_hops(), 3);
        assert_eq!(
            report.failed,
            vec![FailedPage {
                url: "https://a.test/gone".to_string(),
                error: "HTTP 410 Gone".to_string(),
                status: Some(410),
            }]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut report = CrawlReport::new("https://a.test/");
        report.record(SearchResult {
            url: "https://a.test/".to_string(),
            outcome: Outcome::Visited { hops: 0 },
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["target"], "https://a.test/");
        assert_eq!(value["visited"][0]["hops"], 0);
        assert_eq!(value["failed"].as_array().unwrap().len(), 0);
        assert_eq!(value["interrupted"], false);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }
}
