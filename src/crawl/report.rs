// src/crawl/report.rs
// =============================================================================
// Counters kept while the crawl runs, and the summary built from them.
//
// The counters are atomics because the rewriting subtasks of a page bump
// them concurrently. Written pages are counted by distinct file, so the
// landing page reached as both "/" and "/index.html" counts once.
//
// The report is a plain snapshot that can be printed or serialized to JSON.
// =============================================================================

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct CrawlStats {
    // Distinct files written; "/" and "/index.html" share one
    written_files: Mutex<HashSet<PathBuf>>,
    pages_skipped: AtomicUsize,
    leaf_pages: AtomicUsize,
    assets: AtomicUsize,
    failed_downloads: AtomicUsize,
}

impl CrawlStats {
    // Returns true the first time `dest` is written
    pub fn page_written(&self, dest: &Path) -> bool {
        self.written_files.lock().insert(dest.to_path_buf())
    }

    pub fn page_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn leaf_page(&self) {
        self.leaf_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn asset(&self) {
        self.assets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed_download(&self) {
        self.failed_downloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_written(&self) -> usize {
        self.written_files.lock().len()
    }

    pub fn report(&self, output_dir: &Path, total_pages: Option<u64>) -> CrawlReport {
        CrawlReport {
            output_dir: output_dir.to_path_buf(),
            total_pages,
            pages_written: self.pages_written(),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            leaf_pages: self.leaf_pages.load(Ordering::Relaxed),
            assets: self.assets.load(Ordering::Relaxed),
            failed_downloads: self.failed_downloads.load(Ordering::Relaxed),
        }
    }
}

// What a finished crawl produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// Root of the mirror on disk
    pub output_dir: PathBuf,
    /// Page count announced by the first page, if it had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    /// Distinct listing-page files written
    pub pages_written: usize,
    /// Listing pages that failed to fetch or write
    pub pages_skipped: usize,
    /// Detail and category pages saved as-is
    pub leaf_pages: usize,
    /// Images saved
    pub assets: usize,
    /// Leaf pages and images that failed to download
    pub failed_downloads: usize,
}
