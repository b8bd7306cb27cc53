//! Usage: Process configuration read once at startup from environment variables.

use crate::shared::error::{LinkError, LinkResult};
use std::env;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";
const DEFAULT_DB_FILE_NAME: &str = "tunelink.db";
const DEFAULT_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Fallback host for redirect-URI reconstruction when the inbound
    /// request carries no Host header (e.g. behind a misconfigured proxy).
    pub public_domain: Option<String>,
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub authorize_url: String,
    pub token_url: String,
}

impl LinkConfig {
    pub fn from_env() -> LinkResult<Self> {
        Self::from_env_get(|key| env::var(key).ok())
    }

    pub fn from_env_get(mut get: impl FnMut(&str) -> Option<String>) -> LinkResult<Self> {
        let client_id = require_non_empty(&mut get, "SPOTIFY_CLIENT_ID")?;
        let client_secret = require_non_empty(&mut get, "SPOTIFY_CLIENT_SECRET")?;

        let public_domain = get("PUBLIC_DOMAIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let bind_addr = get("TUNELINK_BIND_ADDR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let db_path = get("TUNELINK_DB_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME));

        let authorize_url = get("TUNELINK_AUTHORIZE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHORIZE_URL.to_string());

        let token_url = get("TUNELINK_TOKEN_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());

        Ok(Self {
            client_id,
            client_secret,
            public_domain,
            bind_addr,
            db_path,
            authorize_url,
            token_url,
        })
    }
}

fn require_non_empty(
    get: &mut impl FnMut(&str) -> Option<String>,
    key: &'static str,
) -> LinkResult<String> {
    get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LinkError::invalid_input(format!("missing {key}")))
}
