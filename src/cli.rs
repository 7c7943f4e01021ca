// src/cli.rs
// =============================================================================
// Command-line interface, parsed with clap's derive API.
//
// Every flag is optional. Anything left out falls back to the config file
// (--config) and then to the built-in defaults, so
//
//   catalog-mirror
//
// on its own mirrors https://books.toscrape.com/ into ./books.toscrape.com
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use url::Url;

use crate::config::MirrorConfig;

#[derive(Parser, Debug)]
#[command(
    name = "catalog-mirror",
    version,
    about = "Mirror a paginated catalog website for offline browsing",
    long_about = "catalog-mirror walks a catalog site's listing pages one after another, \
                  saves each page with its navigation links pointing at the local copies, \
                  and downloads the images, book pages and category pages they link to."
)]
pub struct Cli {
    /// Site or catalogue page to start from (default: https://books.toscrape.com/)
    ///
    /// Positional, so `catalog-mirror https://example.com/` works
    pub base_url: Option<Url>,

    /// Directory the mirror is written to (default: books.toscrape.com)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of per-page subtasks allowed to run at once (default: 5)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Per-request timeout in seconds (default: 30)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Read settings from a JSON file; flags given here still win
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Don't draw progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// More log output: -v for info, -vv for debug
    ///
    /// ArgAction::Count turns repeated flags into a number
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    // Lays the command-line flags over a config loaded elsewhere
    pub fn apply_to(&self, config: &mut MirrorConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
    }
}
