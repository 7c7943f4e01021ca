// src/config.rs
// =============================================================================
// Settings for one mirror run.
//
// They come from three places, later ones winning:
// 1. The defaults below
// 2. An optional JSON file (--config mirror.json)
// 3. Command-line flags
//
// The finished MirrorConfig is built once in main and then borrowed by
// everything else. There are no global settings.
//
// Example file:
//   {
//     "baseUrl": "https://books.toscrape.com/",
//     "outputDir": "mirror",
//     "workers": 5
//   }
// =============================================================================

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Page the crawl starts from. Detail, category, image and next-page
    /// links resolve against its site root (scheme + host), so this may be
    /// the landing page or any catalogue page
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Root directory of the offline copy
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Size of the worker pool the per-page subtasks run in
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout; a hung server can't stall the crawl longer
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://books.toscrape.com/").expect("default base URL is valid")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("books.toscrape.com")
}

fn default_workers() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("catalog-mirror/{}", env!("CARGO_PKG_VERSION"))
}

impl MirrorConfig {
    // Reads a JSON config file; missing keys fall back to the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    // Checks the things we can't express in the types
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            bail!("base URL must be http or https, got '{}'", self.base_url);
        }
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        Ok(())
    }
}
