//! Shared types, error model, and configuration for channelkeys.
//!
//! This crate is the foundation depended on by all other channelkeys crates.
//! It provides:
//! - [`ChannelKeysError`]: the run-level error type
//! - Domain types ([`Identifier`], [`CipherPayload`], [`StreamDescriptor`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_USER_AGENT, DETAIL_PREFIX_ENV, DiscoveryConfig, HttpConfig,
    LISTING_URL_ENV, OutputConfig, RunConfig, RunOverrides, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{ChannelKeysError, Result};
pub use types::{CipherPayload, DescriptorMap, Identifier, StreamDescriptor};
