//! Core orchestration for channelkeys.
//!
//! - [`resolver`]: one identifier → [`StreamDescriptor`](channelkeys_shared::StreamDescriptor)
//! - [`pipeline`]: batch aggregation and the full discovery → resolve → save run

pub mod pipeline;
pub mod resolver;

pub use pipeline::{
    BatchAggregator, BatchProgress, BatchSummary, ScrapeOutcome, SilentProgress,
    SkippedIdentifier, run_scrape,
};
pub use channelkeys_storage::LoadSource;
pub use resolver::{DescriptorResolver, ResolveDescriptor, ResolveError, decode_page};
