//! JSON result store.
//!
//! The [`ResultStore`] holds one JSON object mapping identifier → descriptor
//! (`{"<id>": {"mpdUrl": …, "kid": …, "key": …}}`).
//!
//! **Access rules:**
//! - Loading never fails the run: a missing or unreadable file starts an empty map.
//!   Entries that do not hold a full descriptor are dropped one by one; the
//!   rest of the file is kept.
//! - Saving overwrites the whole file in place (no temp file + rename); the
//!   process is the sole writer for the duration of a run.

use std::path::{Path, PathBuf};

use channelkeys_shared::{ChannelKeysError, DescriptorMap, Identifier, Result, StreamDescriptor};
use serde::Serialize;
use serde_json::{Map, Value};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{info, warn};

/// Indentation used for the saved file.
const INDENT: &[u8] = b"    ";

/// How [`ResultStore::load`] obtained its map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from an existing file; `dropped` entries were malformed and skipped.
    File { dropped: usize },
    /// No file yet.
    Missing,
    /// File existed but could not be read or parsed; the reason is kept for logs.
    Unreadable(String),
}

/// File-backed identifier → descriptor map.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted map, substituting an empty one when the file is
    /// absent or malformed.
    pub fn load(&self) -> (DescriptorMap, LoadSource) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no existing data, starting with an empty dataset");
                return (DescriptorMap::new(), LoadSource::Missing);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read existing data, starting with an empty dataset");
                return (DescriptorMap::new(), LoadSource::Unreadable(e.to_string()));
            }
        };

        let entries = match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "existing data is malformed, starting with an empty dataset");
                return (DescriptorMap::new(), LoadSource::Unreadable(e.to_string()));
            }
        };

        let mut map = DescriptorMap::new();
        let mut dropped = 0;
        for (raw_id, value) in entries {
            match decode_entry(&raw_id, value) {
                Ok((id, descriptor)) => {
                    map.insert(id, descriptor);
                }
                Err(reason) => {
                    warn!(id = %raw_id, error = %reason, "dropping malformed entry");
                    dropped += 1;
                }
            }
        }

        info!(path = %self.path.display(), entries = map.len(), dropped, "loaded existing data");
        (map, LoadSource::File { dropped })
    }

    /// Write `map` as pretty-printed JSON, replacing the file's contents.
    pub fn save(&self, map: &DescriptorMap) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ChannelKeysError::io(parent, e))?;
        }

        let body = to_pretty_json(map)?;
        std::fs::write(&self.path, body).map_err(|e| ChannelKeysError::io(&self.path, e))?;

        info!(path = %self.path.display(), entries = map.len(), "saved all data");
        Ok(())
    }
}

fn decode_entry(
    raw_id: &str,
    value: Value,
) -> std::result::Result<(Identifier, StreamDescriptor), String> {
    let id = Identifier::new(raw_id).map_err(|e| e.to_string())?;
    let descriptor = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Ok((id, descriptor))
}

fn to_pretty_json(map: &DescriptorMap) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    map.serialize(&mut ser)
        .map_err(|e| ChannelKeysError::Storage(format!("failed to serialize results: {e}")))?;
    Ok(out)
}
