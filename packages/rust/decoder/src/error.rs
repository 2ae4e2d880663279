//! Typed failures for the pure decode stages.

/// Failure while reversing the stream cipher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Ciphertext is not valid base64 (bad alphabet, padding or length).
    #[error("ciphertext is not valid base64: {0}")]
    InvalidEncoding(String),

    /// The key has no characters to cycle over.
    #[error("cipher key is empty")]
    InvalidKey,

    /// A plaintext character XORed with the key does not fit in one byte,
    /// so it cannot be carried by the ciphertext.
    #[error("character at position {position} cannot be encrypted with this key")]
    OutOfRange { position: usize },
}

/// A required literal was not present in the searched text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The detail page lacks the key literal, the ciphertext literal, or both.
    #[error("cipher payload not found in page (missing: {})", .missing.join(", "))]
    PayloadNotFound { missing: Vec<&'static str> },

    /// The decrypted text lacks one or more descriptor literals.
    #[error("stream fields not found in decrypted text (missing: {})", .missing.join(", "))]
    FieldsNotFound { missing: Vec<&'static str> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_error_lists_missing_literals() {
        let err = ExtractError::FieldsNotFound {
            missing: vec!["kid", "key"],
        };
        assert_eq!(
            err.to_string(),
            "stream fields not found in decrypted text (missing: kid, key)"
        );
    }
}
