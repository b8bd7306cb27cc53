//! Usage: SQLite connection setup, schema migrations, and common DB helpers.

mod migrations;

use crate::shared::error::{LinkError, LinkResult};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(2000);
const POOL_MAX_SIZE: u32 = 8;
const POOL_MIN_IDLE: u32 = 1;
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub fn open_connection(&self) -> LinkResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| LinkError::storage("failed to get connection from pool", e))
    }
}

pub fn init(path: &Path) -> LinkResult<Db> {
    let path_hint = path.to_string_lossy().to_string();

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        configure_connection(conn)
    });

    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .min_idle(Some(POOL_MIN_IDLE))
        .connection_timeout(POOL_CONNECTION_TIMEOUT)
        .build(manager)
        .map_err(|e| LinkError::storage("failed to create db pool", e))?;

    let mut conn = pool
        .get()
        .map_err(|e| LinkError::storage("failed to get startup connection", e))?;

    migrations::apply_migrations(&mut conn)
        .map_err(|e| LinkError::Storage(format!("sqlite migration failed at {path_hint}: {e}")))?;

    Ok(Db { pool })
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA synchronous = NORMAL;
PRAGMA temp_store = MEMORY;
"#,
    )
}
