// src/crawl/testing.rs
// An in-memory site for tests: serves canned pages and assets and records
// every request made to it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use url::Url;

use super::fetch::{Fetch, FetchError};

#[derive(Debug, Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    assets: HashMap<String, Vec<u8>>,
    page_requests: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_asset(mut self, url: &str, body: &[u8]) -> Self {
        self.assets.insert(url.to_string(), body.to_vec());
        self
    }

    /// URLs passed to fetch_page(), in call order
    pub fn page_requests(&self) -> Vec<String> {
        self.page_requests.lock().clone()
    }

    /// URLs passed to download(), in call order, failures included
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }
}

impl Fetch for StubFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        self.page_requests.lock().push(url.to_string());
        tokio::task::yield_now().await;
        self.pages.get(url.as_str()).cloned().ok_or(FetchError::Status(404))
    }

    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        self.downloads.lock().push(url.to_string());
        // Let sibling subtasks interleave the way real network calls would
        tokio::task::yield_now().await;

        let body = match (self.assets.get(url.as_str()), self.pages.get(url.as_str())) {
            (Some(bytes), _) => bytes.clone(),
            (None, Some(html)) => html.clone().into_bytes(),
            (None, None) => return Err(FetchError::Status(404)),
        };

        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}
