//! Usage: Anti-CSRF state token codec (identity + random nonce, cookie round-trip).
//!
//! Canonical format is `<identity>:<nonce>`; the nonce is always required.
//! Verification is exact full-string equality in constant time, then the
//! identity segment is recovered by splitting on the first delimiter.

use crate::shared::error::{LinkError, LinkResult};
use crate::shared::security::constant_time_eq;
use rand::RngCore;
use std::fmt::Write as _;

const STATE_DELIMITER: char = ':';
const NONCE_BYTES: usize = 16;

/// Builds a state token embedding `identity`. Fails on empty identity.
pub fn issue(identity: &str) -> LinkResult<String> {
    let identity = identity.trim();
    if identity.is_empty() {
        return Err(LinkError::invalid_input("identity must not be empty"));
    }

    let mut nonce = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut token = String::with_capacity(identity.len() + 1 + NONCE_BYTES * 2);
    token.push_str(identity);
    token.push(STATE_DELIMITER);
    for byte in nonce {
        let _ = write!(token, "{byte:02x}");
    }
    Ok(token)
}

/// Compares the cookie-stored state against the provider-returned state.
/// Any absence or inequality is a mismatch; on success the embedded
/// identity is extracted. Tokens without a nonce segment are rejected.
pub fn verify(expected: Option<&str>, presented: Option<&str>) -> LinkResult<String> {
    let expected = expected.ok_or(LinkError::StateMismatch)?;
    let presented = presented.ok_or(LinkError::StateMismatch)?;

    if !constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
        return Err(LinkError::StateMismatch);
    }

    extract_identity(presented)
}

fn extract_identity(token: &str) -> LinkResult<String> {
    let (identity, nonce) = token
        .split_once(STATE_DELIMITER)
        .ok_or(LinkError::StateMismatch)?;
    if identity.is_empty() || nonce.is_empty() {
        return Err(LinkError::StateMismatch);
    }
    Ok(identity.to_string())
}
