//! End-to-end scrape pipeline: listing → identifiers → descriptors → store.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use channelkeys_discovery::DiscoveryOptions;
use channelkeys_fetch::PageFetcher;
use channelkeys_shared::{
    ChannelKeysError, DescriptorMap, Identifier, Result, RunConfig, StreamDescriptor,
};
use channelkeys_storage::{LoadSource, ResultStore};

use crate::resolver::{DescriptorResolver, ResolveDescriptor, ResolveError};

/// Characters of the manifest URL shown in success log lines.
const MANIFEST_PREVIEW_CHARS: usize = 25;

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting batch status.
pub trait BatchProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before an identifier is resolved.
    fn resolving(&self, id: &Identifier, current: usize, total: usize);
    /// Called when an identifier resolved successfully.
    fn resolved(&self, id: &Identifier, descriptor: &StreamDescriptor);
    /// Called when an identifier was skipped.
    fn skipped(&self, id: &Identifier, error: &ResolveError);
    /// Called when the batch completes.
    fn done(&self, summary: &BatchSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn resolving(&self, _id: &Identifier, _current: usize, _total: usize) {}
    fn resolved(&self, _id: &Identifier, _descriptor: &StreamDescriptor) {}
    fn skipped(&self, _id: &Identifier, _error: &ResolveError) {}
    fn done(&self, _summary: &BatchSummary) {}
}

// ---------------------------------------------------------------------------
// Batch aggregation
// ---------------------------------------------------------------------------

/// Summary of one batch.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Identifies the run in logs.
    pub run_id: Uuid,
    /// Identifiers attempted.
    pub total: usize,
    /// Identifiers resolved and upserted.
    pub resolved: usize,
    /// Identifiers that failed, in processing order.
    pub skipped: Vec<SkippedIdentifier>,
    /// Wall time spent resolving.
    pub elapsed: Duration,
    /// When the batch finished.
    pub finished_at: DateTime<Utc>,
}

/// One identifier the batch gave up on.
#[derive(Debug, Clone)]
pub struct SkippedIdentifier {
    pub id: Identifier,
    /// [`ResolveError::kind`] label.
    pub kind: &'static str,
    pub reason: String,
}

/// Resolves identifiers one at a time and upserts each success into the map.
pub struct BatchAggregator<'p> {
    progress: &'p dyn BatchProgress,
}

impl<'p> BatchAggregator<'p> {
    pub fn new(progress: &'p dyn BatchProgress) -> Self {
        Self { progress }
    }

    /// Resolve every identifier and merge successes into `store`.
    ///
    /// A failed identifier is logged and skipped; any entry it already had in
    /// `store` is left untouched. Nothing here aborts the batch.
    #[instrument(skip_all, fields(identifiers = identifiers.len()))]
    pub async fn run<R: ResolveDescriptor>(
        &self,
        identifiers: &BTreeSet<Identifier>,
        resolver: &R,
        mut store: DescriptorMap,
    ) -> (DescriptorMap, BatchSummary) {
        let start = Instant::now();
        let run_id = Uuid::now_v7();
        let total = identifiers.len();
        let mut resolved = 0;
        let mut skipped = Vec::new();

        info!(%run_id, total, existing = store.len(), "resolving identifiers");

        for (i, id) in identifiers.iter().enumerate() {
            self.progress.resolving(id, i + 1, total);

            match resolver.resolve(id).await {
                Ok(descriptor) => {
                    info!(
                        %id,
                        mpd_url = descriptor.manifest_preview(MANIFEST_PREVIEW_CHARS),
                        "extracted stream data"
                    );
                    self.progress.resolved(id, &descriptor);
                    store.insert(id.clone(), descriptor);
                    resolved += 1;
                }
                Err(e) => {
                    warn!(%id, kind = e.kind(), error = %e, "skipping identifier");
                    self.progress.skipped(id, &e);
                    skipped.push(SkippedIdentifier {
                        id: id.clone(),
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary {
            run_id,
            total,
            resolved,
            skipped,
            elapsed: start.elapsed(),
            finished_at: Utc::now(),
        };

        info!(
            %run_id,
            resolved = summary.resolved,
            skipped = summary.skipped.len(),
            entries = store.len(),
            duration_ms = summary.elapsed.as_millis(),
            "batch completed"
        );

        (store, summary)
    }
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Result of a full scrape run.
#[derive(Debug)]
pub struct ScrapeOutcome {
    /// The merged mapping, whether or not it reached disk.
    pub results: DescriptorMap,
    /// Batch statistics.
    pub summary: BatchSummary,
    /// Where the starting map came from.
    pub store_source: LoadSource,
    /// Set when the final save failed; the in-memory results are still valid.
    pub save_error: Option<ChannelKeysError>,
}

/// Run the full pipeline.
///
/// 1. Discovery: fetch the listing and collect identifiers (fatal on failure)
/// 2. Load the existing store (missing/corrupt ⇒ empty)
/// 3. Resolve every identifier, merging successes
/// 4. Save the merged store (failure reported, not fatal)
#[instrument(skip_all, fields(listing_url = %config.listing_url))]
pub async fn run_scrape<F: PageFetcher>(
    config: &RunConfig,
    fetcher: &F,
    progress: &dyn BatchProgress,
) -> Result<ScrapeOutcome> {
    // --- Phase 1: Discovery ---
    progress.phase("Discovering channels");
    let opts = DiscoveryOptions::from_run_config(config)?;
    let identifiers =
        channelkeys_discovery::discover(fetcher, config.listing_url.as_str(), &opts).await?;

    // --- Phase 2: Load store ---
    progress.phase("Loading existing data");
    let store = ResultStore::new(&config.output_path);
    let (existing, store_source) = store.load();

    // --- Phase 3: Resolve ---
    progress.phase("Resolving stream data");
    let resolver = DescriptorResolver::new(fetcher, config);
    let (results, summary) = BatchAggregator::new(progress)
        .run(&identifiers, &resolver, existing)
        .await;

    // --- Phase 4: Save ---
    progress.phase("Saving results");
    let save_error = match store.save(&results) {
        Ok(()) => None,
        Err(e) => {
            warn!(path = %store.path().display(), error = %e, "failed to save results");
            Some(e)
        }
    };

    progress.done(&summary);

    Ok(ScrapeOutcome {
        results,
        summary,
        store_source,
        save_error,
    })
}
