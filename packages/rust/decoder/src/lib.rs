//! Pure decode stages: payload extraction, cipher reversal, field extraction.
//!
//! This crate provides:
//! - [`extract_payload`]: key + ciphertext literals from detail page markup
//! - [`decrypt`] / [`encrypt`]: the repeating-key XOR stream over base64
//! - [`extract_fields`]: manifest URL and key material from decrypted text
//!
//! Nothing here performs I/O.

pub mod cipher;
pub mod error;
pub mod extract;

pub use cipher::{decrypt, encrypt};
pub use error::{DecodeError, ExtractError};
pub use extract::{extract_fields, extract_payload};
