// src/crawl/fetch.rs
// =============================================================================
// This module is the crawler's only door to the network.
//
// Key functionality:
// - fetch_page(): GET a page and return its HTML as text
// - download(): GET anything (images, leaf pages) and stream it to a file
// - Any non-2xx status is an error, so callers can simply skip on Err
//
// The rest of the crawler talks to the `Fetch` trait instead of reqwest
// directly. Tests plug in an in-memory implementation; the real program uses
// HttpFetcher.
//
// Rust concepts:
// - Traits: an interface that several types can implement
// - async fn in traits: the trait methods are awaited like any async fn
// - thiserror: derive Display/Error for our own error enum
// =============================================================================

use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::config::MirrorConfig;

// Why a fetch or download failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered, but not with 2xx
    #[error("HTTP {0}")]
    Status(u16),

    /// Connection, TLS, timeout, body decoding...
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Writing the body to disk failed
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

// What the crawler needs from the network
#[allow(async_fn_in_trait)]
pub trait Fetch {
    /// GET `url` and return the body as text
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;

    /// GET `url` and stream the body into `dest`
    ///
    /// Returns the number of bytes written. The parent directory of `dest`
    /// must already exist.
    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, FetchError>;
}

// The real fetcher, backed by one shared reqwest client
//
// The client keeps a connection pool, so reusing it across the whole crawl
// means we don't reconnect for every page.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let html = self.get(url).await?.text().await?;
        Ok(html)
    }

    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let mut response = self.get(url).await?;

        // Only create the file once we know the response is good, so a 404
        // never leaves an empty file behind.
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;

        // chunk() hands the body over piece by piece instead of buffering
        // the whole image in memory
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[from] do?
//    - It generates `impl From<reqwest::Error> for FetchError`
//    - That's what lets `?` turn a reqwest::Error into a FetchError
//
// 2. Why is the status check in get() and not in each caller?
//    - reqwest treats a 404 as a perfectly good response
//    - For us it's a failure, and both methods want the same rule
//
// 3. Why `#[allow(async_fn_in_trait)]`?
//    - async fn in a trait is allowed, but the compiler warns that callers
//      can't require the returned future to be Send
//    - We only ever await these futures on the task that created them, so
//      that doesn't matter here
// -----------------------------------------------------------------------------
