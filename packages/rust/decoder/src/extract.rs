//! Literal-pattern extraction from page markup and decrypted script text.
//!
//! Neither input is parsed structurally. Each value is the first match of a
//! fixed assignment pattern, so surrounding markup is irrelevant.

use std::sync::LazyLock;

use channelkeys_shared::{CipherPayload, StreamDescriptor};
use regex::Regex;

use crate::error::ExtractError;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `const decryptionKey = "...";` in the detail page.
static DECRYPTION_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"const decryptionKey = "(.*?)";"#).expect("decryption key regex")
});

/// Matches `let encrypted = "...";` in the detail page.
static ENCRYPTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"let encrypted = "(.*?)";"#).expect("encrypted regex")
});

/// Matches `const mpdUrl = '...';` in the decrypted script.
static MPD_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"const mpdUrl = '(.*?)';").expect("mpdUrl regex")
});

/// Matches `const kid = '...';`.
static KID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"const kid = '(.*?)';").expect("kid regex")
});

/// Matches `const key = '...';`.
static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"const key = '(.*?)';").expect("key regex")
});

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Pull the cipher key and ciphertext literals out of a detail page.
///
/// Both must be present; otherwise [`ExtractError::PayloadNotFound`] names
/// whichever is missing.
pub fn extract_payload(html: &str) -> Result<CipherPayload, ExtractError> {
    let key = first_capture(&DECRYPTION_KEY_RE, html);
    let ciphertext = first_capture(&ENCRYPTED_RE, html);

    match (key, ciphertext) {
        (Some(key), Some(ciphertext)) => Ok(CipherPayload {
            key: key.to_string(),
            ciphertext: ciphertext.to_string(),
        }),
        (key, ciphertext) => Err(ExtractError::PayloadNotFound {
            missing: missing_names([("decryptionKey", key), ("encrypted", ciphertext)]),
        }),
    }
}

/// Pull the manifest URL, key id and key value out of decrypted script text.
///
/// All three must be present; otherwise [`ExtractError::FieldsNotFound`].
pub fn extract_fields(plaintext: &str) -> Result<StreamDescriptor, ExtractError> {
    let manifest_url = first_capture(&MPD_URL_RE, plaintext);
    let key_id = first_capture(&KID_RE, plaintext);
    let key_value = first_capture(&KEY_VALUE_RE, plaintext);

    match (manifest_url, key_id, key_value) {
        (Some(manifest_url), Some(key_id), Some(key_value)) => Ok(StreamDescriptor {
            manifest_url: manifest_url.to_string(),
            key_id: key_id.to_string(),
            key_value: key_value.to_string(),
        }),
        (manifest_url, key_id, key_value) => Err(ExtractError::FieldsNotFound {
            missing: missing_names([("mpdUrl", manifest_url), ("kid", key_id), ("key", key_value)]),
        }),
    }
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn missing_names<const N: usize>(found: [(&'static str, Option<&str>); N]) -> Vec<&'static str> {
    found
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Player</title></head>
<body>
  <div id="player"></div>
  <script>
    const decryptionKey = "k1";
    let encrypted = "A1g=";
    start(decryptionKey, encrypted);
  </script>
</body></html>"#;

    const SCRIPT: &str = "const mpdUrl = 'https://x/y.mpd';\n\
                          const kid = '00112233';\n\
                          const key = 'aabbccdd';\n\
                          player.load(mpdUrl);";

    #[test]
    fn payload_found_in_markup() {
        let payload = extract_payload(PAGE).unwrap();
        assert_eq!(payload.key, "k1");
        assert_eq!(payload.ciphertext, "A1g=");
    }

    #[test]
    fn payload_found_without_any_html() {
        let payload =
            extract_payload(r#"const decryptionKey = "abc";let encrypted = "Zm9v";"#).unwrap();
        assert_eq!(payload.key, "abc");
        assert_eq!(payload.ciphertext, "Zm9v");
    }

    #[test]
    fn first_payload_match_wins() {
        let html = r#"const decryptionKey = "first"; let encrypted = "AA==";
                      const decryptionKey = "second"; let encrypted = "BB==";"#;
        let payload = extract_payload(html).unwrap();
        assert_eq!(payload.key, "first");
        assert_eq!(payload.ciphertext, "AA==");
    }

    #[test]
    fn missing_key_fails_whole_payload() {
        let err = extract_payload(r#"<script>let encrypted = "A1g=";</script>"#).unwrap_err();
        assert_eq!(
            err,
            ExtractError::PayloadNotFound {
                missing: vec!["decryptionKey"]
            }
        );
    }

    #[test]
    fn missing_ciphertext_fails_whole_payload() {
        let err = extract_payload(r#"const decryptionKey = "k1";"#).unwrap_err();
        assert_eq!(
            err,
            ExtractError::PayloadNotFound {
                missing: vec!["encrypted"]
            }
        );
    }

    #[test]
    fn payload_requires_double_quotes() {
        let err = extract_payload("const decryptionKey = 'k1'; let encrypted = 'A1g=';").unwrap_err();
        assert!(matches!(err, ExtractError::PayloadNotFound { missing } if missing.len() == 2));
    }

    #[test]
    fn empty_page_reports_both_missing() {
        let err = extract_payload("").unwrap_err();
        assert_eq!(err.to_string(), "cipher payload not found in page (missing: decryptionKey, encrypted)");
    }

    #[test]
    fn fields_found_in_script() {
        let d = extract_fields(SCRIPT).unwrap();
        assert_eq!(d.manifest_url, "https://x/y.mpd");
        assert_eq!(d.key_id, "00112233");
        assert_eq!(d.key_value, "aabbccdd");
    }

    #[test]
    fn any_missing_field_fails() {
        let without_kid = SCRIPT.replace("const kid = '00112233';", "");
        let err = extract_fields(&without_kid).unwrap_err();
        assert_eq!(err, ExtractError::FieldsNotFound { missing: vec!["kid"] });

        let without_url = SCRIPT.replace("const mpdUrl", "let mpdUrl");
        assert!(extract_fields(&without_url).is_err());

        let without_key = SCRIPT.replace("const key = 'aabbccdd';", "const key = aabbccdd;");
        assert!(extract_fields(&without_key).is_err());
    }

    #[test]
    fn fields_require_single_quotes() {
        let script = r#"const mpdUrl = "https://x/y.mpd"; const kid = "00"; const key = "11";"#;
        let err = extract_fields(script).unwrap_err();
        assert_eq!(
            err,
            ExtractError::FieldsNotFound {
                missing: vec!["mpdUrl", "kid", "key"]
            }
        );
    }

    #[test]
    fn empty_literal_values_are_accepted() {
        let d = extract_fields("const mpdUrl = ''; const kid = ''; const key = '';").unwrap();
        assert!(d.manifest_url.is_empty());
    }
}
