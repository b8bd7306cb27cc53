//! Usage: OAuth authorization-code flow helpers (state token, authorize URL, token exchange).

pub mod provider;
pub mod state_token;
pub mod token_exchange;
