// src/crawl/rewrite.rs
// =============================================================================
// The five per-page subtasks that make a mirrored page work offline.
//
// 1. images      download every <img> (src is left alone)
// 2. navigation  rewrite "next"/"previous" hrefs, queue their targets
// 3. home        rewrite the "Home" href, queue its target
// 4. details     download each book's detail page as a leaf
// 5. categories  download each sidebar category page as a leaf
//
// They touch disjoint things (navigation and home edit different anchors,
// the others only download), so they run side by side through the worker
// pool and run() waits for all five before handing back the edits.
//
// Two resolution rules are in play:
// - Nav and Home links are resolved against the page they appear on
// - Image, detail and category links are resolved against the site root
//   (scheme + host of the base URL). Detail and category hrefs are first
//   put under "catalogue/", the way the site lays them out.
//
// Rust concepts:
// - futures::join!: run several futures concurrently, wait for all of them
// - let-else: bind a value or bail out of this loop iteration
// - Generics with trait bounds: <F: Fetch> works with any fetcher
// =============================================================================

use std::future::Future;
use tracing::debug;
use url::Url;

use super::context::PageContext;
use super::document::{Anchor, HrefEdit, PageLinks};
use super::driver::Crawl;
use super::fetch::{Fetch, FetchError};
use super::path::{ensure_parent, local_path, relative_href};

/// Number of subtasks run() starts for every page
pub const SUBTASKS: usize = 5;

const CATALOGUE: &str = "catalogue/";

pub struct LinkRewriter<'c, 'a, F> {
    crawl: &'c Crawl<'a, F>,
    page_url: &'c Url,
    context: PageContext,
}

impl<'c, 'a, F: Fetch> LinkRewriter<'c, 'a, F> {
    pub fn new(crawl: &'c Crawl<'a, F>, page_url: &'c Url) -> Self {
        Self {
            crawl,
            page_url,
            context: PageContext::from_url(page_url),
        }
    }

    // Runs all five subtasks and returns the href edits for the page
    //
    // Nothing started here is still running when this returns.
    pub async fn run(&self, links: &PageLinks) -> Vec<HrefEdit> {
        let ((), nav_edits, home_edits, (), ()) = futures::join!(
            self.in_pool(self.images(&links.images)),
            self.in_pool(self.navigation(&links.nav)),
            self.in_pool(self.home(&links.home)),
            self.in_pool(self.details(&links.details)),
            self.in_pool(self.categories(&links.categories)),
        );

        nav_edits.into_iter().chain(home_edits).collect()
    }

    async fn in_pool<T>(&self, task: impl Future<Output = T>) -> T {
        let output = self.crawl.pool.run(task).await;
        self.crawl.progress.subtask_done();
        output
    }

    // Subtask 1: download images that haven't been downloaded yet
    async fn images(&self, sources: &[String]) {
        let base = &self.crawl.site_root;

        for src in sources {
            let Some(url) = resolve_link(base, src) else {
                debug!(src = %src, "skipping unresolvable image");
                continue;
            };
            if !self.crawl.frontier.mark_visited(&url) {
                continue;
            }

            match self.save(&url).await {
                Ok(bytes) => {
                    debug!(url = %url, bytes, "saved image");
                    self.crawl.stats.asset();
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "skipping image");
                    self.crawl.stats.failed_download();
                }
            }
        }
    }

    // Subtask 2: "next" / "previous"
    async fn navigation(&self, anchors: &[Anchor]) -> Vec<HrefEdit> {
        let mut edits = Vec::new();

        for anchor in anchors {
            let Some((target, mut href)) = self.local_target(&anchor.href) else {
                continue;
            };

            // Listing pages live inside catalogue/ themselves, so their
            // siblings are reached without that prefix
            if self.context.is_paginated() {
                href = href.replace(CATALOGUE, "");
            }
            // page-2's "previous" is the landing page, one level up
            if self.context.previous_is_site_root() && anchor.text == "previous" {
                href = "../index.html".to_string();
            }

            edits.push(HrefEdit {
                node: anchor.node,
                href,
            });
            self.crawl.frontier.push(target);
        }

        edits
    }

    // Subtask 3: "Home"
    async fn home(&self, anchors: &[Anchor]) -> Vec<HrefEdit> {
        let mut edits = Vec::new();

        for anchor in anchors {
            let Some((target, mut href)) = self.local_target(&anchor.href) else {
                continue;
            };

            if self.context.is_paginated() {
                href = format!("../{href}");
            }

            edits.push(HrefEdit {
                node: anchor.node,
                href,
            });
            self.crawl.frontier.push(target);
        }

        edits
    }

    // Subtask 4: book detail pages
    async fn details(&self, hrefs: &[String]) {
        for href in hrefs {
            self.save_leaf(href).await;
        }
    }

    // Subtask 5: sidebar category pages
    async fn categories(&self, hrefs: &[String]) {
        for href in hrefs {
            self.save_leaf(href).await;
        }
    }

    // Resolves `href` against this page and works out where its target sits
    // in the mirror, relative to the mirror root
    fn local_target(&self, href: &str) -> Option<(Url, String)> {
        let root = &self.crawl.config.output_dir;
        let target = resolve_link(self.page_url, href)?;
        let relative = relative_href(root, &local_path(root, &target))?;
        Some((target, relative))
    }

    // Downloads a detail/category page as-is; it is not crawled further
    async fn save_leaf(&self, href: &str) {
        let base = &self.crawl.site_root;
        let Some(url) = resolve_link(base, &catalogue_href(href)) else {
            debug!(href = %href, "skipping unresolvable leaf link");
            return;
        };

        // Claim it first: a sibling subtask may see the same link
        if !self.crawl.frontier.mark_visited(&url) {
            return;
        }

        match self.save(&url).await {
            Ok(_) => {
                debug!(url = %url, "saved leaf page");
                self.crawl.stats.leaf_page();
            }
            Err(e) => {
                debug!(url = %url, error = %e, "skipping leaf page");
                self.crawl.stats.failed_download();
            }
        }
    }

    async fn save(&self, url: &Url) -> Result<u64, FetchError> {
        let dest = local_path(&self.crawl.config.output_dir, url);
        ensure_parent(&dest).await?;
        self.crawl.fetcher.download(url, &dest).await
    }
}

// Resolves a possibly-relative link to an absolute URL
//
// Returns None for in-page anchors, non-HTTP schemes, and hrefs that don't
// parse.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

// Puts a site-relative href under "catalogue/"
//
// Listing pages link to books and categories relative to catalogue/, the
// landing page links to them with the prefix already in place. Either way,
// resolved against the base URL, they must end up under catalogue/.
//
//   "a-light-in-the-attic_1000/index.html"   -> "catalogue/a-light-in-the-attic_1000/index.html"
//   "../category/books_1/index.html"         -> "catalogue/category/books_1/index.html"
//   "catalogue/page-2.html"                  -> unchanged
//   "https://elsewhere/x", "/media/x.jpg"    -> unchanged
pub(crate) fn catalogue_href(href: &str) -> String {
    let href = href.trim();
    if href.starts_with('/') || Url::parse(href).is_ok() {
        return href.to_string();
    }

    let mut rest = href;
    while let Some(stripped) = rest.strip_prefix("../") {
        rest = stripped;
    }

    if rest.starts_with(CATALOGUE) {
        rest.to_string()
    } else {
        format!("{CATALOGUE}{rest}")
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does futures::join! give back?
//    - A tuple with one entry per future, in the order they were listed
//    - The futures run concurrently on the current task; join! returns
//      once the slowest one finishes
//    - Subtasks that return nothing produce (), which we match with ()
//
// 2. Why can the subtasks borrow `links` and `self`?
//    - join! never moves the futures onto another task
//    - So they can hold plain references; no Arc, no 'static needed
//
// 3. What is let-else?
//    - `let Some(x) = expr else { continue; };`
//    - Binds x if the pattern matches, otherwise runs the else block, which
//      must leave the current scope (continue, return, break...)
//
// 4. Why mark_visited() *before* downloading?
//    - Two subtasks may find the same category link
//    - Whoever marks it first downloads it; the other sees false and moves on
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::crawl::document::PageDocument;
    use crate::crawl::progress::Progress;
    use crate::crawl::testing::StubFetcher;
    use tempfile::TempDir;

    const BASE: &str = "https://books.example/";

    fn config(dir: &TempDir) -> MirrorConfig {
        MirrorConfig {
            base_url: Url::parse(BASE).unwrap(),
            output_dir: dir.path().to_path_buf(),
            ..MirrorConfig::default()
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    // Rewrites `html` as if it had been fetched from `page`
    async fn rewrite(
        crawl: &Crawl<'_, StubFetcher>,
        page: &str,
        html: &str,
    ) -> (PageDocument, Vec<HrefEdit>) {
        let page = url(page);
        let document = PageDocument::parse(html);
        let edits = LinkRewriter::new(crawl, &page).run(&document.links()).await;
        (document, edits)
    }

    fn href_for(document: &PageDocument, edits: &[HrefEdit], text: &str) -> String {
        let links = document.links();
        let anchor = links
            .nav
            .iter()
            .chain(&links.home)
            .find(|a| a.text == text)
            .unwrap();
        edits.iter().find(|e| e.node == anchor.node).unwrap().href.clone()
    }

    #[test]
    fn test_catalogue_href() {
        assert_eq!(catalogue_href("book_1/index.html"), "catalogue/book_1/index.html");
        assert_eq!(catalogue_href("catalogue/book_1/index.html"), "catalogue/book_1/index.html");
        assert_eq!(
            catalogue_href("../category/books_1/index.html"),
            "catalogue/category/books_1/index.html"
        );
        assert_eq!(catalogue_href("../../../catalogue/page-3.html"), "catalogue/page-3.html");
        assert_eq!(catalogue_href("/media/a.jpg"), "/media/a.jpg");
        assert_eq!(catalogue_href("https://other.example/x"), "https://other.example/x");
    }

    #[test]
    fn test_resolve_link_skips_non_http() {
        let base = url(BASE);
        assert_eq!(resolve_link(&base, "#top"), None);
        assert_eq!(resolve_link(&base, "mailto:x@example.com"), None);
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "  "), None);
        assert_eq!(resolve_link(&base, "ftp://files.example/x"), None);
        assert_eq!(
            resolve_link(&base, "../media/a.jpg").unwrap().as_str(),
            "https://books.example/media/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_page_two_previous_points_at_site_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default();
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"
            <li class="previous"><a href="page-1.html">previous</a></li>
            <li class="next"><a href="page-3.html">next</a></li>
        "#;
        let page = "https://books.example/catalogue/page-2.html";
        let (document, edits) = rewrite(&crawl, page, html).await;

        assert_eq!(href_for(&document, &edits, "previous"), "../index.html");
        assert_eq!(href_for(&document, &edits, "next"), "page-3.html");
    }

    #[tokio::test]
    async fn test_later_page_previous_is_a_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default();
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"<a href="page-4.html">previous</a><a href="page-6.html">next</a>"#;
        let page = "https://books.example/catalogue/page-5.html";
        let (document, edits) = rewrite(&crawl, page, html).await;

        assert_eq!(href_for(&document, &edits, "previous"), "page-4.html");
        assert_eq!(href_for(&document, &edits, "next"), "page-6.html");
    }

    #[tokio::test]
    async fn test_root_page_keeps_catalogue_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default();
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"<a href="index.html">Home</a><a href="catalogue/page-2.html">next</a>"#;
        let (document, edits) = rewrite(&crawl, BASE, html).await;

        assert_eq!(href_for(&document, &edits, "next"), "catalogue/page-2.html");
        assert_eq!(href_for(&document, &edits, "Home"), "index.html");

        let mut queued = Vec::new();
        while let Some(next) = crawl.frontier.pop() {
            queued.push(next.to_string());
        }
        queued.sort();
        assert_eq!(
            queued,
            vec!["https://books.example/catalogue/page-2.html", "https://books.example/index.html"]
        );
    }

    #[tokio::test]
    async fn test_home_from_listing_page_goes_up_a_level() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default();
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"<ul class="breadcrumb"><li><a href="../index.html">Home</a></li></ul>"#;
        let page = "https://books.example/catalogue/page-7.html";
        let (document, edits) = rewrite(&crawl, page, html).await;

        assert_eq!(href_for(&document, &edits, "Home"), "../index.html");
    }

    #[tokio::test]
    async fn test_nav_targets_are_queued_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default();
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        // Top and bottom pagers both link to page 4; page 2 was already done
        crawl.frontier.mark_visited(&url("https://books.example/catalogue/page-2.html"));
        let html = r#"
            <a href="page-2.html">previous</a><a href="page-4.html">next</a>
            <a href="page-2.html">previous</a><a href="page-4.html">next</a>
        "#;
        let (_, edits) = rewrite(&crawl, "https://books.example/catalogue/page-3.html", html).await;

        assert_eq!(edits.len(), 4);
        assert_eq!(crawl.frontier.pending_len(), 1);
        assert_eq!(
            crawl.frontier.pop().unwrap().as_str(),
            "https://books.example/catalogue/page-4.html"
        );
    }

    #[tokio::test]
    async fn test_fan_out_counts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default()
            .with_asset("https://books.example/media/a.jpg", b"a")
            .with_asset("https://books.example/media/b.jpg", b"b")
            .with_asset("https://books.example/media/c.jpg", b"c")
            .with_page("https://books.example/catalogue/book_1/index.html", "<p>1</p>")
            .with_page("https://books.example/catalogue/book_2/index.html", "<p>2</p>")
            .with_page("https://books.example/catalogue/category/books_1/index.html", "<p>c</p>");
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        // 3 images, 2 nav links, 2 detail links; the sidebar repeats one
        // detail link so two subtasks race for it
        let html = r#"
            <div class="side_categories"><ul>
              <li><a href="category/books_1/index.html">Books</a>
                <ul><li><a href="book_1/index.html">Same as a detail link</a></li></ul>
              </li>
            </ul></div>
            <div class="image_container"><a href="book_1/index.html"><img src="../media/a.jpg"></a></div>
            <div class="image_container"><a href="book_2/index.html"><img src="../media/b.jpg"></a></div>
            <img src="../media/c.jpg">
            <a href="page-2.html">previous</a>
            <a href="page-4.html">next</a>
        "#;
        let (_, edits) = rewrite(&crawl, "https://books.example/catalogue/page-3.html", html).await;

        let downloads = fetcher.downloads();
        let images = downloads.iter().filter(|u| u.ends_with(".jpg")).count();
        let book_1 = downloads.iter().filter(|u| u.ends_with("book_1/index.html")).count();

        assert_eq!(images, 3);
        assert_eq!(book_1, 1);
        assert_eq!(downloads.len(), 3 + 2 + 1);
        assert_eq!(edits.len(), 2);
        assert_eq!(progress.subtasks_done(), SUBTASKS as u64);

        assert!(dir.path().join("media/a.jpg").is_file());
        assert!(dir.path().join("catalogue/book_2/index.html").is_file());
        assert!(dir.path().join("catalogue/category/books_1/index.html").is_file());
    }

    #[tokio::test]
    async fn test_failed_image_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher =
            StubFetcher::default().with_asset("https://books.example/media/ok.jpg", b"ok");
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"<img src="media/missing.jpg"><img src="media/ok.jpg"><img>"#;
        rewrite(&crawl, BASE, html).await;

        assert_eq!(fetcher.downloads().len(), 2);
        assert!(dir.path().join("media/ok.jpg").is_file());
        assert!(!dir.path().join("media/missing.jpg").exists());

        let report = crawl.stats.report(dir.path(), None);
        assert_eq!(report.assets, 1);
        assert_eq!(report.failed_downloads, 1);
    }

    #[tokio::test]
    async fn test_visited_leaf_is_not_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let fetcher = StubFetcher::default()
            .with_page("https://books.example/catalogue/book_1/index.html", "<p>1</p>");
        let progress = Progress::hidden();
        let crawl = Crawl::new(&config, &fetcher, &progress);

        let html = r#"<div class="image_container"><a href="book_1/index.html">x</a></div>"#;
        rewrite(&crawl, "https://books.example/catalogue/page-2.html", html).await;
        rewrite(&crawl, "https://books.example/catalogue/page-3.html", html).await;

        assert_eq!(fetcher.downloads().len(), 1);
    }
}
