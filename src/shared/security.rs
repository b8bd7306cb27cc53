//! Usage: Credential hygiene: log-safe masking of secrets and constant-time
//! comparison for state tokens.

use subtle::ConstantTimeEq;

const MASK_VISIBLE_PREFIX: usize = 4;
const MASK_VISIBLE_SUFFIX: usize = 4;

/// Renders a secret (access/refresh token, client secret) for logs, keeping
/// only the outermost characters. Counted in chars, not bytes: values pulled
/// out of provider error bodies are not guaranteed ASCII, and slicing on a
/// byte offset inside a multi-byte char would panic.
pub fn mask_token(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let total = trimmed.chars().count();
    if total <= MASK_VISIBLE_PREFIX + MASK_VISIBLE_SUFFIX {
        return "*".repeat(total);
    }

    let prefix: String = trimmed.chars().take(MASK_VISIBLE_PREFIX).collect();
    let suffix: String = trimmed.chars().skip(total - MASK_VISIBLE_SUFFIX).collect();
    format!("{prefix}...{suffix}")
}

/// State-token equality that does not leak the first differing position
/// through timing. Length still short-circuits, which is fine: token length
/// is public (identity plus a fixed-size nonce).
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
