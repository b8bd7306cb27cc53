//! Usage: Short-code registry (issue, lookup, redeem) over the redemption_codes table.
//!
//! Codes are 6 chars from A-Z0-9 (~31 bits), acceptable only because they
//! are single-use and expire after 120 seconds. Expiry is lazy: checked at
//! read time, with opportunistic deletion to bound table growth.

use crate::infra::db::Db;
use crate::infra::redemption_codes::{self, RedemptionRow};
use crate::shared::error::{LinkError, LinkResult};
use rand::Rng;

pub const CODE_LEN: usize = 6;
pub const CODE_TTL_SECS: i64 = 120;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ISSUE_RETRY_MAX_ATTEMPTS: u32 = 5;

pub fn generate_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Issues a fresh code for `owner`, invalidating any prior live record for
/// that owner first. Delete-then-insert is two storage calls; a concurrent
/// issue for the same owner is a benign last-writer-wins race.
pub fn issue(db: &Db, owner: &str, bundle_json: &str, now_unix: i64) -> LinkResult<String> {
    issue_with_generator(db, owner, bundle_json, now_unix, generate_short_code)
}

fn issue_with_generator(
    db: &Db,
    owner: &str,
    bundle_json: &str,
    now_unix: i64,
    mut next_code: impl FnMut() -> String,
) -> LinkResult<String> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(LinkError::invalid_input("owner identity must not be empty"));
    }

    redemption_codes::delete_by_owner(db, owner)?;

    let mut attempt: u32 = 0;
    loop {
        let code = next_code();
        let row = RedemptionRow {
            code: code.clone(),
            discord_id: owner.to_string(),
            data: bundle_json.to_string(),
            created_at: now_unix,
        };

        if redemption_codes::insert(db, &row)? {
            return Ok(code);
        }

        attempt = attempt.saturating_add(1);
        if attempt >= ISSUE_RETRY_MAX_ATTEMPTS {
            return Err(LinkError::Storage(format!(
                "short code collision persisted after {ISSUE_RETRY_MAX_ATTEMPTS} attempts"
            )));
        }
        tracing::debug!(attempt = attempt, "short code collision; regenerating");
    }
}

/// Fetches a live record by code without consuming it. Safe to repeat.
pub fn lookup(db: &Db, code: &str, now_unix: i64) -> LinkResult<RedemptionRow> {
    let code = normalize_code(code);
    let row = redemption_codes::select_by_code(db, &code)?.ok_or(LinkError::NotFound)?;
    reject_if_expired(db, row, now_unix)
}

/// Redeems a code: fetches, then deletes unconditionally before returning.
/// A second attempt with the same code always observes `NotFound`, even if
/// this call's response is lost in transit (at-most-once delivery).
///
/// When `owner` is given, the record must also belong to that identity;
/// a mismatch is reported as `NotFound`, not a distinguishing error.
pub fn redeem(db: &Db, code: &str, owner: Option<&str>, now_unix: i64) -> LinkResult<String> {
    let code = normalize_code(code);
    let row = redemption_codes::select_by_code(db, &code)?.ok_or(LinkError::NotFound)?;

    if let Some(owner) = owner {
        if row.discord_id != owner.trim() {
            return Err(LinkError::NotFound);
        }
    }

    let row = reject_if_expired(db, row, now_unix)?;
    redemption_codes::delete_by_code(db, &row.code)?;
    Ok(row.data)
}

/// Alternative redemption path when the consumer already knows the owner
/// identity and the short-code step was skipped. Same deletion semantics.
pub fn redeem_by_owner(db: &Db, owner: &str, now_unix: i64) -> LinkResult<String> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(LinkError::invalid_input("owner identity must not be empty"));
    }

    let row = redemption_codes::select_latest_by_owner(db, owner)?.ok_or(LinkError::NotFound)?;
    let row = reject_if_expired(db, row, now_unix)?;
    redemption_codes::delete_by_code(db, &row.code)?;
    Ok(row.data)
}

pub fn remaining_validity_secs(created_at: i64, now_unix: i64) -> i64 {
    (created_at + CODE_TTL_SECS - now_unix).max(0)
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn reject_if_expired(db: &Db, row: RedemptionRow, now_unix: i64) -> LinkResult<RedemptionRow> {
    if now_unix.saturating_sub(row.created_at) > CODE_TTL_SECS {
        // Lazy expiry; physical deletion here is best-effort.
        if let Err(err) = redemption_codes::delete_by_code(db, &row.code) {
            tracing::warn!(error = %err, "failed to delete expired redemption code");
        }
        return Err(LinkError::NotFound);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_expected_shape() {
        for _ in 0..200 {
            let code = generate_short_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn remaining_validity_clamps_to_zero() {
        assert_eq!(remaining_validity_secs(0, CODE_TTL_SECS + 10), 0);
        assert_eq!(remaining_validity_secs(100, 100), CODE_TTL_SECS);
        assert_eq!(remaining_validity_secs(100, 150), CODE_TTL_SECS - 50);
    }

    #[test]
    fn normalize_code_uppercases_and_trims() {
        assert_eq!(normalize_code(" ab12cd "), "AB12CD");
    }

    fn temp_db() -> (tempfile::TempDir, Db) {
        let tmp = tempfile::TempDir::new().expect("temp dir");
        let db = crate::infra::db::init(&tmp.path().join("registry-test.db")).expect("init db");
        (tmp, db)
    }

    fn seed_row(db: &Db, code: &str, owner: &str) {
        let row = RedemptionRow {
            code: code.to_string(),
            discord_id: owner.to_string(),
            data: "{}".to_string(),
            created_at: 0,
        };
        assert!(redemption_codes::insert(db, &row).expect("seed insert"));
    }

    #[test]
    fn issue_regenerates_past_an_occupied_code() {
        let (_tmp, db) = temp_db();
        seed_row(&db, "TAKEN1", "other-user");

        let mut sequence = vec!["TAKEN1".to_string(), "FRESH2".to_string()].into_iter();
        let code = issue_with_generator(&db, "user1", "{}", 0, move || {
            sequence.next().expect("generator exhausted")
        })
        .expect("issue");
        assert_eq!(code, "FRESH2");

        // The colliding owner's record is untouched.
        let other = redemption_codes::select_by_code(&db, "TAKEN1")
            .expect("select")
            .expect("still present");
        assert_eq!(other.discord_id, "other-user");
    }

    #[test]
    fn issue_gives_up_after_bounded_collision_retries() {
        let (_tmp, db) = temp_db();
        seed_row(&db, "TAKEN1", "other-user");

        let mut calls: u32 = 0;
        let err = issue_with_generator(&db, "user1", "{}", 0, || {
            calls += 1;
            "TAKEN1".to_string()
        })
        .expect_err("exhausted retries");
        assert!(matches!(err, LinkError::Storage(_)));
        assert_eq!(calls, ISSUE_RETRY_MAX_ATTEMPTS);
    }
}
