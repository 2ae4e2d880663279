//! Per-identifier resolution: detail page → payload → plaintext → descriptor.

use std::future::Future;

use channelkeys_decoder::{DecodeError, ExtractError};
use channelkeys_fetch::{FetchRequest, PageFetcher};
use channelkeys_shared::{ChannelKeysError, Identifier, RunConfig, StreamDescriptor};
use tracing::debug;

/// Why one identifier could not be resolved. Never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Detail page request failed (network, timeout, non-2xx).
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] ChannelKeysError),

    /// Detail page lacks the key or ciphertext literal.
    #[error("payload missing: {0}")]
    PayloadMissing(#[source] ExtractError),

    /// Ciphertext or key could not be used.
    #[error("decrypt failed: {0}")]
    DecryptFailed(#[source] DecodeError),

    /// Decrypted text lacks one of the descriptor literals.
    #[error("fields missing: {0}")]
    FieldsMissing(#[source] ExtractError),
}

impl ResolveError {
    /// Stable short label for logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FetchFailed(_) => "fetch_failed",
            Self::PayloadMissing(_) => "payload_missing",
            Self::DecryptFailed(_) => "decrypt_failed",
            Self::FieldsMissing(_) => "fields_missing",
        }
    }
}

/// Run the pure stages over an already fetched detail page.
pub fn decode_page(html: &str) -> Result<StreamDescriptor, ResolveError> {
    let payload = channelkeys_decoder::extract_payload(html).map_err(ResolveError::PayloadMissing)?;
    let plaintext = channelkeys_decoder::decrypt(&payload.ciphertext, &payload.key)
        .map_err(ResolveError::DecryptFailed)?;
    channelkeys_decoder::extract_fields(&plaintext).map_err(ResolveError::FieldsMissing)
}

/// Anything that can turn an identifier into a descriptor.
///
/// The batch only depends on this, so tests can drive it without a network.
pub trait ResolveDescriptor: Send + Sync {
    fn resolve(
        &self,
        id: &Identifier,
    ) -> impl Future<Output = Result<StreamDescriptor, ResolveError>> + Send;
}

/// Fetches the detail page through a [`PageFetcher`] and decodes it.
pub struct DescriptorResolver<'a, F> {
    fetcher: &'a F,
    config: &'a RunConfig,
}

impl<'a, F: PageFetcher> DescriptorResolver<'a, F> {
    pub fn new(fetcher: &'a F, config: &'a RunConfig) -> Self {
        Self { fetcher, config }
    }

    /// Resolve `id` from an explicit detail page URL.
    ///
    /// The page is requested with the configured User-Agent and the page
    /// itself as `Referer`. No retries.
    pub async fn resolve_at(
        &self,
        id: &Identifier,
        detail_url: &str,
    ) -> Result<StreamDescriptor, ResolveError> {
        debug!(%id, %detail_url, "processing identifier");

        let request = FetchRequest::new(detail_url)
            .header("User-Agent", self.config.user_agent.as_str())
            .header("Referer", detail_url)
            .timeout_secs(self.config.detail_timeout_secs);

        let html = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(ResolveError::FetchFailed)?;

        decode_page(&html)
    }
}

impl<F: PageFetcher> ResolveDescriptor for DescriptorResolver<'_, F> {
    async fn resolve(&self, id: &Identifier) -> Result<StreamDescriptor, ResolveError> {
        let detail_url = self.config.detail_url(id);
        self.resolve_at(id, &detail_url).await
    }
}
