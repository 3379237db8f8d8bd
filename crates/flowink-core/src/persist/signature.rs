//! Tamper-evident trailer for saved documents.
//!
//! A sealed document is the body followed by one trailer line:
//!
//! ```text
//! <body>
//! #signature:<base64 sha256(key || body)>
//! ```

use base64::{Engine, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use thiserror::Error;

const MARKER: &[u8] = b"\n#signature:";

/// Integrity check failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("file has been altered: signature is missing")]
    Missing,
    #[error("file has been altered: signature is malformed")]
    Malformed,
    #[error("file has been altered")]
    Mismatch,
}

fn digest(body: &[u8], key: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(body);
    hasher.finalize().to_vec()
}

/// Append the signature trailer to `body`.
pub fn seal(body: &[u8], key: &str) -> Vec<u8> {
    let signature = STANDARD.encode(digest(body, key));
    let mut sealed = Vec::with_capacity(body.len() + MARKER.len() + signature.len() + 1);
    sealed.extend_from_slice(body);
    sealed.extend_from_slice(MARKER);
    sealed.extend_from_slice(signature.as_bytes());
    sealed.push(b'\n');
    sealed
}

/// Verify a sealed document and return its body.
pub fn open<'a>(sealed: &'a [u8], key: &str) -> Result<&'a [u8], IntegrityError> {
    let at = sealed
        .windows(MARKER.len())
        .rposition(|w| w == MARKER)
        .ok_or(IntegrityError::Missing)?;
    let body = &sealed[..at];
    let trailer = std::str::from_utf8(&sealed[at + MARKER.len()..])
        .map_err(|_| IntegrityError::Malformed)?
        .trim_end();
    let signature = STANDARD
        .decode(trailer)
        .map_err(|_| IntegrityError::Malformed)?;
    if signature != digest(body, key) {
        return Err(IntegrityError::Mismatch);
    }
    Ok(body)
}
