//! Repeating-key XOR stream cipher over base64 text.
//!
//! Not a security primitive: it only reverses the obfuscation applied to the
//! player script. The key is indexed by character (code point), not by byte,
//! and each output value becomes the character with that code point. A key
//! made of ASCII characters therefore yields one Latin-1 character per
//! ciphertext byte.

use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, prelude::BASE64_STANDARD};

use crate::error::DecodeError;

/// Standard alphabet with required padding, but non-zero bits in the last
/// symbol are discarded instead of rejected.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode `ciphertext_b64` and XOR every byte with the key character at the
/// same position modulo the key length.
///
/// ASCII whitespace inside the ciphertext (line wrapping) is ignored.
pub fn decrypt(ciphertext_b64: &str, key: &str) -> Result<String, DecodeError> {
    let key = key_points(key)?;

    let compact: Vec<u8> = ciphertext_b64
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = LENIENT_STANDARD
        .decode(compact)
        .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;

    Ok(bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(&b, &k)| to_char(u32::from(b) ^ k))
        .collect())
}

/// Inverse of [`decrypt`]: XOR each plaintext character with the key and
/// base64-encode the resulting bytes.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, DecodeError> {
    let key = key_points(key)?;

    let bytes = plaintext
        .chars()
        .zip(key.iter().cycle())
        .enumerate()
        .map(|(position, (c, &k))| {
            u8::try_from(u32::from(c) ^ k).map_err(|_| DecodeError::OutOfRange { position })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(BASE64_STANDARD.encode(bytes))
}

fn key_points(key: &str) -> Result<Vec<u32>, DecodeError> {
    let points: Vec<u32> = key.chars().map(u32::from).collect();
    if points.is_empty() {
        return Err(DecodeError::InvalidKey);
    }
    Ok(points)
}

// XOR with a byte only flips the low 8 bits, so the value stays in the key
// character's 256-block and can never land on a surrogate.
fn to_char(value: u32) -> char {
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}
