// src/crawl/mod.rs
// =============================================================================
// This module mirrors a catalog website to disk.
//
// Features:
// - Breadth-first crawl over the site's paginated listing pages
// - Each URL maps to one file under the output directory
// - Navigation and Home links are rewritten to point at the local copies
// - Images, book detail pages and category pages are downloaded alongside
// - Per-page work runs concurrently in a small worker pool
//
// Submodules, leaves first:
// - path: URL -> local file path
// - fetch: the network boundary (trait + reqwest implementation)
// - document: parsed page, link extraction, serialization with edits
// - context: where a page sits in the site (root, catalogue, page-N)
// - queue: the frontier (pending queue + visited set)
// - pool: bounded worker pool
// - progress: overall and per-page progress bars
// - rewrite: the five per-page subtasks
// - worker: one page, start to finish
// - driver: the crawl loop
// - report: counters and the final summary
// =============================================================================

mod context;
mod document;
mod driver;
mod fetch;
mod path;
mod pool;
mod progress;
mod queue;
mod report;
mod rewrite;
mod worker;

#[cfg(test)]
mod testing;

// Re-export what main.rs needs
pub use driver::mirror_site;
pub use fetch::HttpFetcher;
pub use progress::Progress;
pub use report::CrawlReport;
