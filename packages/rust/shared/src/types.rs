//! Core domain types shared by the decode pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ChannelKeysError, Result};

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Opaque content identifier harvested from the listing page (hex-looking).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap a raw token. Empty or whitespace-only tokens are rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ChannelKeysError::validation("identifier must not be empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = ChannelKeysError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// CipherPayload
// ---------------------------------------------------------------------------

/// The key + ciphertext literal pair pulled out of a detail page.
///
/// Only ever constructed with both halves present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherPayload {
    /// Repeating XOR key, as text.
    pub key: String,
    /// Base64-encoded ciphertext.
    pub ciphertext: String,
}

// ---------------------------------------------------------------------------
// StreamDescriptor
// ---------------------------------------------------------------------------

/// Manifest URL plus key material for one identifier: the unit persisted
/// in the result store.
///
/// Serialized with the field names of the on-disk format
/// (`mpdUrl`, `kid`, `key`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// DASH manifest URL.
    #[serde(rename = "mpdUrl")]
    pub manifest_url: String,
    /// Key identifier.
    #[serde(rename = "kid")]
    pub key_id: String,
    /// Key value.
    #[serde(rename = "key")]
    pub key_value: String,
}

impl StreamDescriptor {
    /// Leading slice of the manifest URL, for log lines.
    pub fn manifest_preview(&self, max_chars: usize) -> &str {
        match self.manifest_url.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.manifest_url[..idx],
            None => &self.manifest_url,
        }
    }
}

/// Identifier → descriptor mapping. Ordered so the saved file diffs cleanly.
pub type DescriptorMap = BTreeMap<Identifier, StreamDescriptor>;

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor {
            manifest_url: "https://cdn.example.com/live/ch1/manifest.mpd".into(),
            key_id: "00112233".into(),
            key_value: "aabbccdd".into(),
        }
    }

    #[test]
    fn descriptor_uses_store_field_names() {
        let json = serde_json::to_value(descriptor()).unwrap();
        assert_eq!(json["mpdUrl"], "https://cdn.example.com/live/ch1/manifest.mpd");
        assert_eq!(json["kid"], "00112233");
        assert_eq!(json["key"], "aabbccdd");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn descriptor_rejects_missing_field() {
        let partial = r#"{"mpdUrl": "https://x/y.mpd", "kid": "00"}"#;
        assert!(serde_json::from_str::<StreamDescriptor>(partial).is_err());
    }

    #[test]
    fn manifest_preview_truncates_on_char_boundary() {
        let d = descriptor();
        assert_eq!(d.manifest_preview(25), "https://cdn.example.com/l");
        assert_eq!(d.manifest_preview(500), d.manifest_url);

        let wide = StreamDescriptor {
            manifest_url: "ééé".into(),
            ..descriptor()
        };
        assert_eq!(wide.manifest_preview(2), "éé");
    }

    #[test]
    fn identifier_rejects_empty() {
        assert!(Identifier::new("").is_err());
        assert!(Identifier::new("   ").is_err());
        assert_eq!(Identifier::new("AB12").unwrap().as_str(), "AB12");
    }

    #[test]
    fn identifier_serializes_as_plain_string() {
        let id: Identifier = "ab12".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ab12\"");
    }
}
