//! Usage: SQLite schema migrations (user_version + incremental upgrades).

use crate::shared::error::{LinkError, LinkResult};
use rusqlite::Connection;

const LATEST_SCHEMA_VERSION: i64 = 1;

pub(super) fn apply_migrations(conn: &mut Connection) -> LinkResult<()> {
    let mut user_version = read_user_version(conn)?;

    if user_version < 0 || user_version > LATEST_SCHEMA_VERSION {
        return Err(LinkError::Storage(format!(
            "unsupported sqlite schema version: user_version={user_version} (expected 0..={LATEST_SCHEMA_VERSION})"
        )));
    }

    if user_version == 0 {
        create_baseline_v1(conn)?;
        user_version = read_user_version(conn)?;
        tracing::info!(to_version = user_version, "sqlite baseline schema created");
    }

    Ok(())
}

fn create_baseline_v1(conn: &mut Connection) -> LinkResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| LinkError::storage("failed to start sqlite transaction", e))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS redemption_codes (
  code TEXT NOT NULL,
  discord_id TEXT NOT NULL,
  data TEXT NOT NULL,
  created_at INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_redemption_codes_code
  ON redemption_codes (code);
CREATE INDEX IF NOT EXISTS idx_redemption_codes_discord_id
  ON redemption_codes (discord_id);
"#,
    )
    .map_err(|e| LinkError::storage("failed to create baseline schema", e))?;

    set_user_version(&tx, LATEST_SCHEMA_VERSION)?;
    tx.commit()
        .map_err(|e| LinkError::storage("failed to commit sqlite transaction", e))
}

fn read_user_version(conn: &Connection) -> LinkResult<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| LinkError::storage("failed to read sqlite user_version", e))
}

fn set_user_version(tx: &rusqlite::Transaction<'_>, version: i64) -> LinkResult<()> {
    tx.pragma_update(None, "user_version", version)
        .map_err(|e| LinkError::storage("failed to update sqlite user_version", e))
}
