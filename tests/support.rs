#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tunelink::config::LinkConfig;
use tunelink::db::{self, Db};
use tunelink::routes::{build_router, AppState};

/// Test fixture owning a throwaway sqlite database and a router wired to it.
pub struct TestApp {
    pub db: Db,
    pub config: Arc<LinkConfig>,
    _tmp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        // Unroutable token endpoint: any test that reaches the exchange
        // without a mock provider fails fast instead of calling out.
        Self::with_token_url("http://127.0.0.1:9/api/token")
    }

    pub fn with_token_url(token_url: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let db_path: PathBuf = tmp.path().join("tunelink-test.db");
        let db = db::init(&db_path).expect("init db");

        let config = Arc::new(LinkConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            public_domain: Some("link.test".to_string()),
            bind_addr: "127.0.0.1:0".to_string(),
            db_path,
            authorize_url: "https://accounts.spotify.com/authorize".to_string(),
            token_url: token_url.to_string(),
        });

        Self {
            db,
            config,
            _tmp: tmp,
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            db: self.db.clone(),
            client: reqwest::Client::new(),
            config: self.config.clone(),
        })
    }
}
