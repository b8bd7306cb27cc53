//! Usage: HTTP surface of the handshake (login, callback, redeem) and router wiring.

use crate::domain::registry;
use crate::gateway::pages;
use crate::infra::config::LinkConfig;
use crate::infra::db::Db;
use crate::oauth::{provider, state_token, token_exchange};
use crate::shared::blocking;
use crate::shared::error::LinkError;
use crate::shared::time::now_unix_seconds;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const STATE_COOKIE_NAME: &str = "spotify_auth_state";
const STATE_COOKIE_MAX_AGE_SECS: u32 = 300;
const CALLBACK_PATH: &str = "/callback";

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub client: reqwest::Client,
    pub config: Arc<LinkConfig>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/login", get(login))
        .route(CALLBACK_PATH, get(callback))
        .route("/redeem", get(redeem).post(redeem))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app: &'static str,
    version: &'static str,
    ts: i64,
}

async fn root() -> &'static str {
    "tunelink is running"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: "tunelink",
        version: env!("CARGO_PKG_VERSION"),
        ts: now_unix_seconds(),
    })
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    uid: Option<String>,
}

/// Initiate: bind the browser session to a known Discord identity and
/// redirect to the provider authorize endpoint.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    let uid = query
        .uid
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let Some(uid) = uid else {
        return (StatusCode::BAD_REQUEST, "Missing Discord ID").into_response();
    };

    let token = match state_token::issue(uid) {
        Ok(token) => token,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let redirect_uri = reconstruct_redirect_uri(&headers, &state.config);
    let authorize_url = match provider::build_authorize_url(
        &state.config.authorize_url,
        &state.config.client_id,
        &redirect_uri,
        &token,
    ) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!(error = %err, "failed to build authorize url");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error()))
                .into_response();
        }
    };

    tracing::info!(discord_id = %uid, "handshake initiated");

    (
        StatusCode::FOUND,
        [
            (header::LOCATION, authorize_url),
            (header::SET_COOKIE, state_cookie_set(&token)),
        ],
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    c: Option<String>,
}

/// Complete + display/refresh. Branch order matters: the state guard runs
/// before anything else whenever an authorization code is present.
async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let now = now_unix_seconds();
    let stored_state = state_cookie(&headers);

    // State guard: an auth code without a verified state is a forged or
    // replayed redirect. Rejected, not an error.
    let verified = match query.code.as_deref() {
        Some(auth_code) => {
            match state_token::verify(stored_state.as_deref(), query.state.as_deref()) {
                Ok(identity) => Some((auth_code, identity)),
                Err(_) => {
                    tracing::warn!("callback rejected: state mismatch");
                    return (StatusCode::BAD_REQUEST, Html(pages::state_rejected()))
                        .into_response();
                }
            }
        }
        None => None,
    };

    // Display/refresh mode: idempotent re-render of an issued code.
    if let Some(existing) = query.c.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        let db = state.db.clone();
        let existing = existing.to_string();
        let looked_up =
            blocking::run("code display lookup", move || registry::lookup(&db, &existing, now))
                .await;
        return match looked_up {
            Ok(row) => {
                let remaining = registry::remaining_validity_secs(row.created_at, now);
                Html(pages::code_display(&row.code, remaining)).into_response()
            }
            Err(LinkError::NotFound) => Html(pages::code_expired()).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "code display lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error())).into_response()
            }
        };
    }

    // Direct navigation without a provider redirect.
    let Some((auth_code, identity)) = verified else {
        return Html(pages::invalid_access()).into_response();
    };

    let redirect_uri = reconstruct_redirect_uri(&headers, &state.config);
    let exchange_req = token_exchange::TokenExchangeRequest {
        token_url: state.config.token_url.clone(),
        client_id: state.config.client_id.clone(),
        client_secret: state.config.client_secret.clone(),
        code: auth_code.to_string(),
        redirect_uri,
    };

    let bundle = match token_exchange::exchange_authorization_code(&state.client, &exchange_req)
        .await
    {
        Ok(bundle) => bundle,
        Err(err) => {
            tracing::error!(error = %err, discord_id = %identity, "token exchange failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error()))
                .into_response();
        }
    };

    let db = state.db.clone();
    let owner = identity.clone();
    let bundle_json = bundle.to_json_string();
    let issued = blocking::run("short code issuance", move || {
        registry::issue(&db, &owner, &bundle_json, now)
    })
    .await;
    let code = match issued {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, discord_id = %identity, "short code issuance failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::server_error()))
                .into_response();
        }
    };

    tracing::info!(discord_id = %identity, "credential bundle staged for redemption");

    // Redirect to the display sub-route so a browser refresh re-renders the
    // code instead of re-submitting the consumed authorization code. The
    // state cookie is cleared: it is consumed exactly once.
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, format!("{CALLBACK_PATH}?c={code}")),
            (header::SET_COOKIE, state_cookie_clear()),
        ],
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
struct RedeemParams {
    code: Option<String>,
    discord_id: Option<String>,
}

/// One-shot handoff to the bot. Body parameters take precedence over query.
async fn redeem(
    State(state): State<AppState>,
    Query(query): Query<RedeemParams>,
    body: Option<Form<RedeemParams>>,
) -> Response {
    let body = body.map(|Form(params)| params).unwrap_or_default();
    let code =
        first_non_empty(body.code.as_deref(), query.code.as_deref()).map(str::to_string);
    let discord_id = first_non_empty(body.discord_id.as_deref(), query.discord_id.as_deref())
        .map(str::to_string);

    let now = now_unix_seconds();
    let db = state.db.clone();
    let outcome = match (code, discord_id) {
        (Some(code), discord_id) => {
            blocking::run("code redemption", move || {
                registry::redeem(&db, &code, discord_id.as_deref(), now)
            })
            .await
        }
        (None, Some(discord_id)) => {
            blocking::run("owner redemption", move || {
                registry::redeem_by_owner(&db, &discord_id, now)
            })
            .await
        }
        (None, None) => Err(LinkError::invalid_input("missing code or discord_id")),
    };

    match outcome.and_then(|raw| token_exchange::CredentialBundle::from_json_str(&raw)) {
        Ok(bundle) => Json(bundle.into_value()).into_response(),
        Err(err) => err.into_response(),
    }
}

fn first_non_empty<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.map(str::trim).filter(|v| !v.is_empty()))
}

/// API-consumer error mapping. Internals are logged, never rendered.
impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            LinkError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
            LinkError::StateMismatch => {
                (StatusCode::BAD_REQUEST, "state mismatch".to_string())
            }
            LinkError::NotFound => (
                StatusCode::NOT_FOUND,
                "invalid or expired code".to_string(),
            ),
            LinkError::TokenExchange(detail)
            | LinkError::Storage(detail)
            | LinkError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn state_cookie_set(token: &str) -> String {
    format!(
        "{STATE_COOKIE_NAME}={token}; Path=/; HttpOnly; Secure; SameSite=None; Max-Age={STATE_COOKIE_MAX_AGE_SECS}"
    )
}

fn state_cookie_clear() -> String {
    format!("{STATE_COOKIE_NAME}=; Path=/; HttpOnly; Secure; SameSite=None; Max-Age=0")
}

fn state_cookie(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some(token) = pair.trim().strip_prefix(STATE_COOKIE_NAME) {
                if let Some(token) = token.strip_prefix('=') {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }
    None
}

/// The authorization code is bound by the provider to the exact redirect
/// URI used at authorize time, so it is rebuilt from the inbound request
/// (honoring the reverse proxy's forwarded protocol) rather than hardcoded.
fn reconstruct_redirect_uri(headers: &HeaderMap, config: &LinkConfig) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("https");

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or(config.public_domain.as_deref())
        .unwrap_or("localhost");

    format!("{proto}://{host}{CALLBACK_PATH}")
}
