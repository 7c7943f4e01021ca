// src/crawl/context.rs
// =============================================================================
// Where a page lives in the site decides how some of its links have to be
// rewritten. A link to "catalogue/page-3.html" is fine from the site root,
// but from inside catalogue/page-2.html it must become "page-3.html".
//
// We work that out once per page, from its URL, and hand the answer to each
// rewriting subtask as plain data.
// =============================================================================

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContext {
    /// Anything outside `/catalogue/`, most importantly the landing page
    Root,
    /// Under `/catalogue/` but not a numbered listing page
    Catalogue,
    /// `/catalogue/page-N.html`
    Paginated(u32),
}

impl PageContext {
    pub fn from_url(url: &Url) -> Self {
        let path = url.path();
        let file_name = path.rsplit('/').next().unwrap_or_default();

        if let Some(page) = page_number(file_name) {
            return PageContext::Paginated(page);
        }

        if path.starts_with("/catalogue/") {
            PageContext::Catalogue
        } else {
            PageContext::Root
        }
    }

    pub fn is_paginated(self) -> bool {
        matches!(self, PageContext::Paginated(_))
    }

    /// `page-2` is special: its "previous" page is the site root, not a
    /// `page-1.html` that the site never links to.
    pub fn previous_is_site_root(self) -> bool {
        self == PageContext::Paginated(2)
    }
}

// "page-12.html" -> Some(12)
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".html")?
        .parse()
        .ok()
}
