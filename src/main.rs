// src/main.rs
// =============================================================================
// This is the entry point of the sitemapper CLI.
//
// What happens here:
// 1. Parse command-line arguments and set up logging
// 2. Start the crawl and consume its result stream, updating the progress
//    display as pages come in
// 3. Write the sitemap and print a report
// 4. Exit with a proper code (0 = done, 1 = interrupted, 2 = error)
//
// Ctrl-C cancels the crawl: no new pages are started, the pages already in
// flight finish, and the partial sitemap is still written.
// =============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sitemapper::cli::Cli;
use sitemapper::crawl::{Crawler, HttpFetcher, Outcome};
use sitemapper::logging::init_logging;
use sitemapper::progress::CrawlProgress;
use sitemapper::report::{print_report, CrawlReport};
use sitemapper::sitemap::UrlSet;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = sitemap written
//   Ok(1) = sitemap written, but the crawl was interrupted
//   Err   = anything fatal (bad target, bad flags, unwritable output)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log.as_deref())?;

    let options = cli.crawl_options()?;
    let fetcher = HttpFetcher::new(cli.fetch_config()).context("failed to build HTTP client")?;
    let crawler = Crawler::new(Arc::new(fetcher), options);

    let cancel = CancellationToken::new();
    let mut results = crawler.crawl(&cli.target, cancel.clone())?;
    // Fail now rather than after a long crawl; dropping `results` stops it
    let mut out = cli.output.create()?;

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, waiting for pages in flight");
            ctrl_c.cancel();
        }
    });

    let started = Instant::now();
    let mut progress = CrawlProgress::new(cli.quiet);
    let mut report = CrawlReport::new(&cli.target);
    progress.println(format!("🔍 Crawling {}", cli.target));

    while let Some(result) = results.next().await {
        progress.record(&result);
        if let Outcome::Failed(error) = &result.outcome {
            progress.println(format!("{}: {}", result.url, error));
        }
        report.record(result);
    }

    report.elapsed_secs = started.elapsed().as_secs_f64();
    report.interrupted = cancel.is_cancelled();
    progress.finish(format!("Finished crawling {}", progress.counters()));
    info!(
        visited = report.visited.len(),
        failed = report.failed.len(),
        admitted = results.history().len(),
        "crawl finished"
    );

    let sitemap = UrlSet::from_pages(report.pages(), Some(chrono::Utc::now()));
    sitemap.write(cli.output.format, &mut out)?;
    out.flush()
        .with_context(|| format!("cannot write {}", cli.output.path.display()))?;
    progress.println(format!(
        "💾 Sitemap with {} URL(s) saved to {}",
        sitemap.len(),
        cli.output.path.display()
    ));

    print_report(&report, cli.json)?;

    Ok(if report.interrupted { 1 } else { 0 })
}
