//! Usage: Row-level helpers for the redemption_codes table (insert/select/delete).

use crate::infra::db::Db;
use crate::shared::error::{LinkError, LinkResult};
use rusqlite::{params, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRow {
    pub code: String,
    pub discord_id: String,
    /// Opaque credential bundle JSON; stored and forwarded, never inspected.
    pub data: String,
    pub created_at: i64,
}

/// Inserts a new row. Returns `Ok(false)` when the code collides with a
/// live row (unique constraint), so the caller can regenerate and retry.
pub fn insert(db: &Db, row: &RedemptionRow) -> LinkResult<bool> {
    let conn = db.open_connection()?;
    let result = conn.execute(
        r#"
INSERT INTO redemption_codes (code, discord_id, data, created_at)
VALUES (?1, ?2, ?3, ?4)
"#,
        params![row.code, row.discord_id, row.data, row.created_at],
    );

    match result {
        Ok(_) => Ok(true),
        Err(err) if is_unique_violation(&err) => Ok(false),
        Err(err) => Err(LinkError::storage("failed to insert redemption code", err)),
    }
}

pub fn select_by_code(db: &Db, code: &str) -> LinkResult<Option<RedemptionRow>> {
    let conn = db.open_connection()?;
    let mut stmt = conn
        .prepare(
            r#"
SELECT code, discord_id, data, created_at
FROM redemption_codes
WHERE code = ?1
"#,
        )
        .map_err(|e| LinkError::storage("failed to prepare code lookup", e))?;

    let mut rows = stmt
        .query_map(params![code], map_row)
        .map_err(|e| LinkError::storage("failed to query redemption code", e))?;

    match rows.next() {
        Some(row) => row
            .map(Some)
            .map_err(|e| LinkError::storage("failed to read redemption code row", e)),
        None => Ok(None),
    }
}

/// Newest live row for an owner. At most one is expected, but a concurrent
/// issue race can briefly leave two; the newest wins.
pub fn select_latest_by_owner(db: &Db, discord_id: &str) -> LinkResult<Option<RedemptionRow>> {
    let conn = db.open_connection()?;
    let mut stmt = conn
        .prepare(
            r#"
SELECT code, discord_id, data, created_at
FROM redemption_codes
WHERE discord_id = ?1
ORDER BY created_at DESC
LIMIT 1
"#,
        )
        .map_err(|e| LinkError::storage("failed to prepare owner lookup", e))?;

    let mut rows = stmt
        .query_map(params![discord_id], map_row)
        .map_err(|e| LinkError::storage("failed to query redemption code by owner", e))?;

    match rows.next() {
        Some(row) => row
            .map(Some)
            .map_err(|e| LinkError::storage("failed to read redemption code row", e)),
        None => Ok(None),
    }
}

pub fn delete_by_code(db: &Db, code: &str) -> LinkResult<usize> {
    let conn = db.open_connection()?;
    conn.execute(
        "DELETE FROM redemption_codes WHERE code = ?1",
        params![code],
    )
    .map_err(|e| LinkError::storage("failed to delete redemption code", e))
}

pub fn delete_by_owner(db: &Db, discord_id: &str) -> LinkResult<usize> {
    let conn = db.open_connection()?;
    conn.execute(
        "DELETE FROM redemption_codes WHERE discord_id = ?1",
        params![discord_id],
    )
    .map_err(|e| LinkError::storage("failed to delete redemption codes by owner", e))
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RedemptionRow> {
    Ok(RedemptionRow {
        code: row.get("code")?,
        discord_id: row.get("discord_id")?,
        data: row.get("data")?,
        created_at: row.get("created_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}
