//! Usage: Unified error model for the link handshake (maps failures to HTTP outcomes).

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// A required request parameter is missing or empty (400).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// CSRF state check failed. A security rejection, never a 5xx.
    #[error("state mismatch")]
    StateMismatch,

    /// The provider token endpoint refused or failed the exchange (500).
    /// The message carries sanitized provider detail for logs only.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Backing store call failed (500, logged, generic message to user).
    #[error("storage failure: {0}")]
    Storage(String),

    /// Service-side misconfiguration, e.g. an unparseable authorize
    /// endpoint (500, logged). Not attributable to the provider.
    #[error("internal error: {0}")]
    Internal(String),

    /// Code absent, expired, or owned by someone else. Deliberately
    /// indistinguishable between those cases.
    #[error("not found")]
    NotFound,
}

impl LinkError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn storage(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{context}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_carries_context_and_cause() {
        let err = LinkError::storage("failed to prepare query", "disk I/O error");
        assert_eq!(
            err.to_string(),
            "storage failure: failed to prepare query: disk I/O error"
        );
    }

    #[test]
    fn not_found_renders_without_detail() {
        assert_eq!(LinkError::NotFound.to_string(), "not found");
    }
}
