//! Identifier discovery from the channel listing page.
//!
//! Fetches the listing page once, selects the channel anchors and pulls the
//! identifier out of each link target. A failed fetch or an empty result is
//! fatal to the run.

mod parser;

use std::collections::BTreeSet;

use channelkeys_fetch::{FetchRequest, PageFetcher};
use channelkeys_shared::{ChannelKeysError, Identifier, Result, RunConfig};
use tracing::{info, instrument};

pub use parser::IdentifierPattern;

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery process.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// User-Agent header value.
    pub user_agent: String,
    /// Timeout for the listing request in seconds.
    pub timeout_secs: u64,
    /// Anchor selector and identifier pattern.
    pub pattern: IdentifierPattern,
}

impl DiscoveryOptions {
    /// Build options from a resolved run config, compiling its patterns.
    pub fn from_run_config(config: &RunConfig) -> Result<Self> {
        Ok(Self {
            user_agent: config.user_agent.clone(),
            timeout_secs: config.listing_timeout_secs,
            pattern: IdentifierPattern::new(&config.selector, &config.id_pattern)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Fetch `listing_url` and return the distinct identifiers it links to.
///
/// Returns [`ChannelKeysError::Discovery`] if the fetch fails or no
/// identifier is found.
#[instrument(skip_all, fields(url = %listing_url))]
pub async fn discover<F: PageFetcher>(
    fetcher: &F,
    listing_url: &str,
    opts: &DiscoveryOptions,
) -> Result<BTreeSet<Identifier>> {
    info!("fetching channel listing");

    let request = FetchRequest::new(listing_url)
        .header("User-Agent", opts.user_agent.as_str())
        .timeout_secs(opts.timeout_secs);

    let html = fetcher.fetch(&request).await.map_err(|e| {
        ChannelKeysError::discovery(format!("failed to fetch listing {listing_url}: {e}"))
    })?;

    let ids = parser::parse_identifiers(&html, &opts.pattern);
    info!(count = ids.len(), "found unique channel identifiers");

    if ids.is_empty() {
        return Err(ChannelKeysError::discovery(format!(
            "no identifiers found on {listing_url}"
        )));
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use channelkeys_fetch::HttpFetcher;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn opts() -> DiscoveryOptions {
        DiscoveryOptions {
            user_agent: "channelkeys-test".into(),
            timeout_secs: 5,
            pattern: IdentifierPattern::new(
                r#"div.channel a[href*="play.php?id="]"#,
                "id=([a-fA-F0-9]+)",
            )
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_discover_with_mock_server() {
        let server = MockServer::start().await;

        let listing = std::fs::read_to_string("../../../fixtures/html/listing.html")
            .expect("read listing fixture");

        Mock::given(method("GET"))
            .and(path("/channels"))
            .and(header("User-Agent", "channelkeys-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(&listing))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("channelkeys-test").unwrap();
        let url = format!("{}/channels", server.uri());
        let ids = discover(&fetcher, &url, &opts()).await.unwrap();

        let ids: Vec<&str> = ids.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, vec!["AB12", "c0ffee"]);
    }

    #[tokio::test]
    async fn test_discover_fetch_failure_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("channelkeys-test").unwrap();
        let err = discover(&fetcher, &server.uri(), &opts()).await.unwrap_err();

        assert!(matches!(err, ChannelKeysError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_discover_empty_listing_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body>No channels</body></html>"),
            )
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new("channelkeys-test").unwrap();
        let err = discover(&fetcher, &server.uri(), &opts()).await.unwrap_err();

        assert!(err.to_string().contains("no identifiers"));
    }
}
