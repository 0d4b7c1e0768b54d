// src/progress.rs
// =============================================================================
// Live crawl counters shown while the result stream is being consumed.
//
// The spinner line reads like:
//   ⠋ [00:00:12] [ 41 accepted | 2 errors | 43 total | 3 hops deep ]
// With --quiet there is no spinner and lines go straight to stderr.
// =============================================================================

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::time::Duration;

use crate::crawl::SearchResult;

/// Running totals derived from the result stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCounters {
    pub accepted: usize,
    pub errors: usize,
    pub total: usize,
    pub max_hops: usize,
}

impl CrawlCounters {
    pub fn record(&mut self, result: &SearchResult) {
        self.total += 1;
        match result.hops() {
            Some(hops) => {
                self.accepted += 1;
                self.max_hops = self.max_hops.max(hops);
            }
            None => self.errors += 1,
        }
    }
}

impl fmt::Display for CrawlCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ {} accepted | {} errors | {} total | {} hops deep ]",
            self.accepted, self.errors, self.total, self.max_hops
        )
    }
}

/// Spinner with the counters, or nothing at all in quiet mode.
pub struct CrawlProgress {
    bar: Option<ProgressBar>,
    counters: CrawlCounters,
}

impl CrawlProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = (!quiet).then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self {
            bar,
            counters: CrawlCounters::default(),
        }
    }

    pub fn record(&mut self, result: &SearchResult) {
        self.counters.record(result);
        if let Some(bar) = &self.bar {
            bar.set_message(self.counters.to_string());
        }
    }

    /// Prints a line above the spinner (plain stderr when quiet).
    pub fn println(&self, line: impl AsRef<str>) {
        match &self.bar {
            Some(bar) => bar.println(line.as_ref()),
            None => eprintln!("{}", line.as_ref()),
        }
    }

    pub fn finish(&self, message: impl Into<String>) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.into());
        }
    }

    pub fn counters(&self) -> CrawlCounters {
        self.counters
    }
}
