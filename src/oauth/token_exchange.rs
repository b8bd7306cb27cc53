//! Usage: Authorization-code-for-credential exchange against the provider token endpoint.
//!
//! Authenticates with HTTP Basic only, keeping the client secret out of
//! request bodies. Never retried: the authorization code is single-use.

use crate::shared::error::{LinkError, LinkResult};
use crate::shared::security::mask_token;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::collections::HashMap;

/// Opaque credential payload from the provider. Stored and forwarded as-is;
/// this service never inspects or mutates its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialBundle(Value);

impl CredentialBundle {
    pub fn from_json_str(raw: &str) -> LinkResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| LinkError::Storage(format!("stored credential bundle invalid: {e}")))?;
        Ok(Self(value))
    }

    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TokenExchangeRequest {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

pub async fn exchange_authorization_code(
    client: &reqwest::Client,
    req: &TokenExchangeRequest,
) -> LinkResult<CredentialBundle> {
    let mut form: HashMap<&str, String> = HashMap::new();
    form.insert("grant_type", "authorization_code".to_string());
    form.insert("code", req.code.trim().to_string());
    form.insert("redirect_uri", req.redirect_uri.trim().to_string());

    let response = client
        .post(req.token_url.trim())
        .header(
            reqwest::header::AUTHORIZATION,
            basic_auth_header(&req.client_id, &req.client_secret),
        )
        .form(&form)
        .send()
        .await
        .map_err(|e| LinkError::TokenExchange(format!("token request failed: {e}")))?;

    parse_token_response(response).await
}

fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let credentials = format!("{}:{}", client_id.trim(), client_secret.trim());
    format!("Basic {}", STANDARD.encode(credentials))
}

async fn parse_token_response(response: reqwest::Response) -> LinkResult<CredentialBundle> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LinkError::TokenExchange(format!("token response read failed: {e}")))?;

    if !status.is_success() {
        let (error_code, error_message) = parse_oauth_error_details(&body);
        let snippet = sanitize_error_body_snippet(&body);
        let mut msg = format!("token endpoint returned status={}", status.as_u16());
        if let Some(code) = error_code {
            msg.push_str(" code=");
            msg.push_str(code.as_str());
        }
        if let Some(detail) = error_message {
            msg.push_str(" message=");
            msg.push_str(detail.chars().take(240).collect::<String>().as_str());
        }
        msg.push_str(" body=");
        msg.push_str(snippet.as_str());
        return Err(LinkError::TokenExchange(msg));
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| LinkError::TokenExchange(format!("token response json invalid: {e}")))?;

    if !value.is_object() {
        return Err(LinkError::TokenExchange(
            "token response is not a json object".to_string(),
        ));
    }

    Ok(CredentialBundle(value))
}

fn parse_oauth_error_details(body: &str) -> (Option<String>, Option<String>) {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return (None, None),
    };

    let code = value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let message = value
        .get("error_description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    (code, message)
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lc = key.trim().to_ascii_lowercase();
    key_lc.contains("token") || key_lc.contains("secret") || key_lc == "authorization"
}

fn redact_sensitive_json_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_sensitive_key(key) {
                    if let Some(raw) = nested.as_str() {
                        *nested = Value::String(mask_token(raw));
                        continue;
                    }
                }
                redact_sensitive_json_fields(nested);
            }
        }
        Value::Array(items) => {
            for nested in items {
                redact_sensitive_json_fields(nested);
            }
        }
        _ => {}
    }
}

fn sanitize_error_body_snippet(body: &str) -> String {
    if let Ok(mut value) = serde_json::from_str::<Value>(body) {
        redact_sensitive_json_fields(&mut value);
        if let Ok(encoded) = serde_json::to_string(&value) {
            return encoded.chars().take(500).collect();
        }
    }
    body.chars().take(500).collect()
}
