//! Usage: Spotify authorization endpoint constants and authorize-URL construction.

use crate::shared::error::{LinkError, LinkResult};
use reqwest::Url;

/// Scope set requested at authorize time. Fixed; this service models
/// exactly one provider grant, not a general OAuth client.
pub const SCOPES: &[&str] = &[
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-private",
    "user-read-email",
    "user-library-read",
    "user-library-modify",
    "user-top-read",
];

pub fn build_authorize_url(
    authorize_url: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> LinkResult<String> {
    let url = Url::parse_with_params(
        authorize_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", SCOPES.join(" ").as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| LinkError::Internal(format!("authorize endpoint misconfigured: {e}")))?;

    Ok(url.to_string())
}
