// src/crawl/worker.rs
// =============================================================================
// Processes one listing page, start to finish:
//
//   fetch -> (skip on failure) -> rewrite -> write to disk -> find next page
//
// The parsed document belongs to this function alone. The rewriting
// subtasks only see a snapshot of its links and send back href edits,
// which are applied when the page is written out.
// =============================================================================

use std::io;
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};
use url::Url;

use super::document::{HrefEdit, PageDocument, PageLinks};
use super::driver::Crawl;
use super::fetch::Fetch;
use super::path::{ensure_parent, local_path};
use super::rewrite::{catalogue_href, resolve_link, LinkRewriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Fetch or write failed; nothing was saved
    Skipped,
    /// Page saved; `next_page` is the pagination link that was queued
    Written { next_page: Option<Url> },
}

impl<'a, F: Fetch> Crawl<'a, F> {
    pub async fn process_page(&self, url: &Url) -> PageOutcome {
        let body = match self.fetcher.fetch_page(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "skipping page");
                self.stats.page_skipped();
                return PageOutcome::Skipped;
            }
        };

        let document = PageDocument::parse(&body);
        let links = document.links();

        if !self.page_count_checked.swap(true, Ordering::Relaxed) {
            self.record_page_count(url, &links);
        }

        // Fan out, then wait for all five subtasks before writing
        let edits = LinkRewriter::new(self, url).run(&links).await;

        let dest = local_path(&self.config.output_dir, url);
        if let Err(e) = write_page(&document, &edits, &dest).await {
            warn!(url = %url, path = %dest.display(), error = %e, "could not write page");
            self.stats.page_skipped();
            return PageOutcome::Skipped;
        }
        if self.stats.page_written(&dest) {
            self.progress.page_done();
        }
        debug!(url = %url, path = %dest.display(), edits = edits.len(), "wrote page");

        PageOutcome::Written {
            next_page: self.discover_next(&links),
        }
    }

    // The first fetched page tells us how many listing pages there are
    fn record_page_count(&self, url: &Url, links: &PageLinks) {
        match links.page_count {
            Some(total) => {
                info!(total, "found page count");
                self.progress.set_total_pages(total);
            }
            None => warn!(url = %url, "no page count on first page, progress will be unbounded"),
        }
    }

    // Queues the page the "next" pagination link points at
    fn discover_next(&self, links: &PageLinks) -> Option<Url> {
        let href = links.next_page.as_deref()?;
        let next = resolve_link(&self.site_root, &catalogue_href(href))?;

        self.frontier.push(next.clone());
        Some(next)
    }
}

async fn write_page(document: &PageDocument, edits: &[HrefEdit], dest: &Path) -> io::Result<()> {
    ensure_parent(dest).await?;
    let html = document.render(edits)?;
    tokio::fs::write(dest, html).await
}
