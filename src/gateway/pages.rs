//! Usage: Human-facing HTML pages for the browser half of the handshake.

const PLAIN_STYLE: &str = "font-family:sans-serif;text-align:center;margin-top:60px";
const DARK_STYLE: &str =
    "font-family:sans-serif;text-align:center;margin-top:100px;color:white;background:#000";

pub fn state_rejected() -> String {
    format!(
        "<html><body style=\"{PLAIN_STYLE}\">\
<h1>State Mismatch</h1>\
<p>Your Spotify login attempt was rejected.</p>\
</body></html>"
    )
}

pub fn invalid_access() -> String {
    format!(
        "<html><body style=\"{PLAIN_STYLE}\">\
<h1>Invalid Access</h1>\
<p>You must login from Discord.</p>\
</body></html>"
    )
}

pub fn server_error() -> String {
    format!(
        "<html><body style=\"{PLAIN_STYLE}\">\
<h1>Server Error</h1>\
<p>Something went wrong during Spotify authentication.</p>\
</body></html>"
    )
}

pub fn code_expired() -> String {
    format!(
        "<html><body style=\"{DARK_STYLE}\">\
<h1>Code Expired</h1>\
<p>Your code is no longer valid.</p>\
</body></html>"
    )
}

/// Renders a live short code. `code` is always a server-generated value
/// from the registry, never raw query input.
pub fn code_display(code: &str, remaining_secs: i64) -> String {
    format!(
        "<html><body style=\"{DARK_STYLE}\">\
<h1>Your Spotify Login Code</h1>\
<h2 style=\"font-size:48px;letter-spacing:8px;\">{code}</h2>\
<p>This code expires in about {remaining_secs} seconds. Do not share it.</p>\
</body></html>"
    )
}
