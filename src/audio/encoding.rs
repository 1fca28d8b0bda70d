//! base64 transport encoding for speech payloads and image attachments

use crate::{Result, ZeitgeistError};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Decode a standard-alphabet, padded base64 string into raw bytes.
///
/// The input must not carry a `data:` URI prefix.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .map_err(|e| ZeitgeistError::MalformedEncoding(e.to_string()))
}

/// Encode bytes with the standard alphabet and `=` padding.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
