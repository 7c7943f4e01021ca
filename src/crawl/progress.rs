// src/crawl/progress.rs
// =============================================================================
// Two progress counters for a mirror run:
// - overall: one unit per listing page. Unbounded until the first page tells
//   us how many pages there are ("Page 1 of 50").
// - page: one unit per finished rewriting subtask of the current page.
//
// Both are indicatif bars under one MultiProgress so they redraw together.
// A hidden Progress draws nothing, which is what tests and --quiet use.
// =============================================================================

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use url::Url;

use super::rewrite::SUBTASKS;

pub struct Progress {
    overall: ProgressBar,
    page: ProgressBar,
}

impl Progress {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let overall = multi.add(ProgressBar::new_spinner());
        overall.set_style(overall_style());
        overall.set_message("Overall progress");

        let page = multi.add(ProgressBar::new(SUBTASKS as u64));
        page.set_style(page_style());

        Self { overall, page }
    }

    // Called once, when the first page reveals the page count
    pub fn set_total_pages(&self, total: u32) {
        self.overall.set_length(u64::from(total));
        self.overall.set_style(overall_bar_style());
    }

    pub fn start_page(&self, url: &Url) {
        self.page.reset();
        self.page.set_message(format!("Processing page: {url}"));
    }

    pub fn subtask_done(&self) {
        self.page.inc(1);
    }

    pub fn page_done(&self) {
        self.overall.inc(1);
    }

    pub fn finish(&self) {
        self.page.finish_and_clear();
        self.overall.finish_with_message("Mirror completed");
    }

    pub fn total_pages(&self) -> Option<u64> {
        self.overall.length()
    }

    pub fn pages_done(&self) -> u64 {
        self.overall.position()
    }

    #[cfg(test)]
    pub fn subtasks_done(&self) -> u64 {
        self.page.position()
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

// The templates below are literals; with_template only fails on a malformed
// template, in which case we fall back to indicatif's default look.

fn overall_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} pages {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn overall_bar_style() -> ProgressStyle {
    let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pages ({eta}) {msg}";
    ProgressStyle::with_template(template)
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn page_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:20.green/white} {pos}/{len} {msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overall_is_unbounded_until_total_known() {
        let progress = Progress::hidden();
        assert_eq!(progress.total_pages(), None);

        progress.page_done();
        progress.set_total_pages(50);

        assert_eq!(progress.total_pages(), Some(50));
        assert_eq!(progress.pages_done(), 1);
    }

    #[test]
    fn test_page_counter_resets_per_page() {
        let progress = Progress::hidden();
        let url = Url::parse("https://books.example/").unwrap();

        progress.start_page(&url);
        for _ in 0..SUBTASKS {
            progress.subtask_done();
        }
        assert_eq!(progress.subtasks_done(), SUBTASKS as u64);

        progress.start_page(&url);
        assert_eq!(progress.subtasks_done(), 0);
    }
}
