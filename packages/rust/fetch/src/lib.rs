//! Page-fetch collaborator.
//!
//! Everything upstream talks to the network through [`PageFetcher`]: given a
//! URL, headers and a timeout, return the response body or a transport error.
//! [`HttpFetcher`] is the reqwest-backed implementation; tests substitute
//! in-memory fetchers.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use channelkeys_shared::{ChannelKeysError, Result};
use reqwest::Client;
use tracing::debug;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Timeout used when a request does not set one.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// FetchRequest
// ---------------------------------------------------------------------------

/// A single GET request: target URL, extra headers, timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_secs: u64,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Add or replace a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Returns the body text for a request, or a [`ChannelKeysError::Network`]
/// on timeout, connection failure or a non-2xx status.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// reqwest-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client that sends `user_agent` unless a request overrides it.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ChannelKeysError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let url = request.url.as_str();
        debug!(%url, timeout_secs = request.timeout_secs, "fetching page");

        let mut builder = self
            .client
            .get(url)
            .timeout(Duration::from_secs(request.timeout_secs));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ChannelKeysError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelKeysError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(ChannelKeysError::Network(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        response
            .text()
            .await
            .map_err(|e| ChannelKeysError::Network(format!("{url}: failed to read body: {e}")))
    }
}
