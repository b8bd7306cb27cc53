use std::sync::Arc;
use std::time::Duration;

use tunelink::config::LinkConfig;
use tunelink::routes::{build_router, AppState};
use tunelink::{db, server};

const TOKEN_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "tunelink failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = LinkConfig::from_env().map_err(|e| e.to_string())?;

    let db = db::init(&config.db_path).map_err(|e| e.to_string())?;

    let client = reqwest::Client::builder()
        .user_agent(format!("tunelink/{}", env!("CARGO_PKG_VERSION")))
        .timeout(TOKEN_EXCHANGE_TIMEOUT)
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        db,
        client,
        config: Arc::new(config),
    };

    let listener = server::bind(&bind_addr).await?;
    server::serve(listener, build_router(state)).await
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
