pub mod domain;
pub mod gateway;
pub mod infra;
pub mod oauth;
pub mod shared;

pub use domain::registry;
pub use gateway::{routes, server};
pub use infra::{config, db, redemption_codes};
pub use oauth::{provider, state_token, token_exchange};
pub use shared::error::{LinkError, LinkResult};
