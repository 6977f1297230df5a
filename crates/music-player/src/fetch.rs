//! Byte fetch stage.
//!
//! Fetches are blocking calls; the player runs them on a worker thread and
//! receives the bytes over its event channel.

use std::io::Read;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use crate::source::FILE_SCHEME;

/// Retrieves the full contents of a resolved URL.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher for `file://` and `http(s)://` URLs.
#[derive(Clone, Debug, Default)]
pub struct UrlFetcher {
    timeout: Option<Duration>,
}

impl UrlFetcher {
    /// `timeout` bounds each HTTP call; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>> {
        let started = Instant::now();
        let request = ureq::get(url);
        let request = match self.timeout {
            Some(timeout) => request.config().timeout_per_call(Some(timeout)).build(),
            None => request,
        };
        let resp = request
            .call()
            .map_err(|e| anyhow!("http request failed: {e}"))?;

        let mut buf = Vec::new();
        let (_, body) = resp.into_parts();
        body.into_reader()
            .read_to_end(&mut buf)
            .context("http read failed")?;

        tracing::debug!(
            url = %url,
            bytes = buf.len(),
            took_ms = started.elapsed().as_millis() as u64,
            "http fetch complete"
        );
        Ok(buf)
    }
}

impl Fetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = local_path(url) {
            return std::fs::read(path).with_context(|| format!("read {path}"));
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_http(url);
        }
        Err(anyhow!("unsupported url scheme: {url}"))
    }
}

/// Filesystem path of a `file://` URL (`file:///a/b` → `/a/b`).
fn local_path(url: &str) -> Option<&str> {
    url.strip_prefix(FILE_SCHEME)
}
