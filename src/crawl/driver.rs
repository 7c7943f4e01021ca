// src/crawl/driver.rs
// =============================================================================
// The crawl loop.
//
// How it works:
// 1. Put the base URL in the frontier
// 2. Take the oldest URL out
// 3. Skip it if it was already visited, otherwise mark it visited
// 4. Let the page worker fetch, rewrite and save it (see worker.rs)
//    The overall progress bar moves once per new listing-page file
// 5. Repeat until the frontier is empty
//
// Pages are handled one at a time. Only the work *inside* a page (images,
// links, leaf downloads) runs concurrently.
//
// Everything one crawl needs lives in the Crawl struct: the settings and
// fetcher it borrows, plus the frontier, pool and counters it owns. It is
// built once and passed around by reference.
//
// Rust concepts:
// - Lifetimes on structs: Crawl<'a, F> borrows config/fetcher for 'a
// - while let: loop while pop() keeps returning Some
// - Generics: the same loop runs against HttpFetcher or a test stub
// =============================================================================

use anyhow::{Context, Result};
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};
use url::Url;

use super::fetch::Fetch;
use super::pool::WorkerPool;
use super::progress::Progress;
use super::queue::Frontier;
use super::report::{CrawlReport, CrawlStats};
use crate::config::MirrorConfig;

pub struct Crawl<'a, F> {
    pub(crate) config: &'a MirrorConfig,
    pub(crate) fetcher: &'a F,
    pub(crate) progress: &'a Progress,
    /// Scheme + host of the base URL; image, detail, category and next-page
    /// links resolve against this, wherever the crawl was seeded
    pub(crate) site_root: Url,
    /// Set once the first fetched page has been checked for a page count
    pub(crate) page_count_checked: AtomicBool,
    pub(crate) frontier: Frontier,
    pub(crate) pool: WorkerPool,
    pub(crate) stats: CrawlStats,
}

impl<'a, F: Fetch> Crawl<'a, F> {
    pub fn new(config: &'a MirrorConfig, fetcher: &'a F, progress: &'a Progress) -> Self {
        Self {
            config,
            fetcher,
            progress,
            site_root: site_root(&config.base_url),
            page_count_checked: AtomicBool::new(false),
            frontier: Frontier::new(),
            pool: WorkerPool::new(config.workers),
            stats: CrawlStats::default(),
        }
    }

    // Mirrors the whole site, starting from the configured base URL
    //
    // The base URL may be any page of the site, e.g. a catalogue page; links
    // are still resolved against the site root.
    //
    // Individual pages and images that fail are skipped and counted; only a
    // problem with the output directory itself is returned as an error.
    pub async fn run(&self) -> Result<CrawlReport> {
        let root = &self.config.output_dir;
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("creating output directory {}", root.display()))?;

        info!(
            base = %self.config.base_url,
            output = %root.display(),
            workers = self.pool.size(),
            "starting mirror"
        );
        self.frontier.push(self.config.base_url.clone());

        while let Some(url) = self.frontier.pop() {
            if !self.frontier.mark_visited(&url) {
                debug!(url = %url, "already visited");
                continue;
            }

            debug!(url = %url, pending = self.frontier.pending_len(), "processing page");
            self.progress.start_page(&url);
            self.process_page(&url).await;
        }

        self.progress.finish();

        let report = self.stats.report(root, self.progress.total_pages());
        info!(
            pages = report.pages_written,
            skipped = report.pages_skipped,
            leaves = report.leaf_pages,
            assets = report.assets,
            visited = self.frontier.visited_len(),
            progress = self.progress.pages_done(),
            "mirror finished"
        );
        Ok(report)
    }
}

// "https://books.example/catalogue/page-1.html?x" -> "https://books.example/"
fn site_root(base: &Url) -> Url {
    let mut root = base.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

// Convenience wrapper: build a Crawl and run it
pub async fn mirror_site<F: Fetch>(
    config: &MirrorConfig,
    fetcher: &F,
    progress: &Progress,
) -> Result<CrawlReport> {
    Crawl::new(config, fetcher, progress).run().await
}
