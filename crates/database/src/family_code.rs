//! Family code registry.
//!
//! Each elderly profile has at most one active code. Replacing a code is
//! destructive: retired codes are not kept.

use rand::Rng;
use sqlx::{SqliteConnection, SqlitePool};

use crate::elderly;
use crate::error::{DatabaseError, Result};
use crate::models::ElderlyProfile;
use crate::validation::{validate_family_code, validate_id};
use crate::Database;

/// Prefix of every generated code.
pub const CODE_PREFIX: &str = "YAO-";

/// Number of random symbols after the prefix.
pub const CODE_LENGTH: usize = 8;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Attempts at minting a code that is not already bound elsewhere.
const MAX_GENERATE_ATTEMPTS: usize = 5;

/// Generate a code like `YAO-7K2Q9D1X`.
///
/// Symbols are drawn uniformly from `[A-Z0-9]`. Uniqueness is enforced on
/// insert, not here.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}

/// Get the current code for a profile, if one was issued.
pub async fn get_code(pool: &SqlitePool, elderly_id: i64) -> Result<Option<String>> {
    validate_id("elderly_id", elderly_id)?;

    let code = sqlx::query_scalar::<_, String>(
        r#"
        SELECT code
        FROM family_code
        WHERE elderly_id = ?
        "#,
    )
    .bind(elderly_id)
    .fetch_optional(pool)
    .await?;

    Ok(code)
}

/// Replace a profile's code with `explicit`, or with a freshly generated one.
///
/// Always leaves exactly one code bound to the profile.
pub async fn rotate(db: &Database, elderly_id: i64, explicit: Option<&str>) -> Result<String> {
    validate_id("elderly_id", elderly_id)?;
    let explicit = explicit.map(validate_family_code).transpose()?;

    let _guard = db.lock_elderly(elderly_id).await;
    let mut tx = db.pool().begin().await?;
    let code = replace_code(&mut tx, elderly_id, explicit).await?;
    tx.commit().await?;

    tracing::info!(elderly_id, "Family code rotated");
    Ok(code)
}

/// Resolve a family code to the profile it grants access to.
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<ElderlyProfile> {
    let code = validate_family_code(code)?;

    let elderly_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT elderly_id
        FROM family_code
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "FamilyCode",
        id: code.to_string(),
    })?;

    elderly::get_profile(pool, elderly_id).await
}

/// Current code, read on an open connection.
pub(crate) async fn current_code(
    conn: &mut SqliteConnection,
    elderly_id: i64,
) -> Result<Option<String>> {
    let code = sqlx::query_scalar::<_, String>(
        r#"
        SELECT code
        FROM family_code
        WHERE elderly_id = ?
        "#,
    )
    .bind(elderly_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(code)
}

/// Delete the profile's code row and insert `code`, or a generated one.
///
/// Callers run this inside a transaction while holding the profile lock.
pub(crate) async fn replace_code(
    conn: &mut SqliteConnection,
    elderly_id: i64,
    code: Option<&str>,
) -> Result<String> {
    sqlx::query(
        r#"
        DELETE FROM family_code
        WHERE elderly_id = ?
        "#,
    )
    .bind(elderly_id)
    .execute(&mut *conn)
    .await?;

    if let Some(code) = code {
        insert_code(conn, elderly_id, code).await?;
        return Ok(code.to_string());
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        let code = generate_code();
        match insert_code(conn, elderly_id, &code).await {
            Ok(()) => return Ok(code),
            Err(DatabaseError::AlreadyExists { .. }) if attempt < MAX_GENERATE_ATTEMPTS => {
                tracing::warn!(elderly_id, attempt, "Generated family code collided, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

async fn insert_code(conn: &mut SqliteConnection, elderly_id: i64, code: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO family_code (elderly_id, code)
        VALUES (?, ?)
        "#,
    )
    .bind(elderly_id)
    .bind(code)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "FamilyCode",
                    id: code.to_string(),
                };
            }
        }
        DatabaseError::missing_parent(e, "Elderly", elderly_id)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SaveProfile;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn new_profile(db: &Database, name: &str) -> ElderlyProfile {
        elderly::save_profile(
            db,
            &SaveProfile {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    async fn count_rows(db: &Database, elderly_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM family_code WHERE elderly_id = ?")
            .bind(elderly_id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    fn is_well_formed(code: &str) -> bool {
        let Some(suffix) = code.strip_prefix(CODE_PREFIX) else {
            return false;
        };
        suffix.len() == CODE_LENGTH
            && suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }

    #[test]
    fn test_generate_code_format() {
        for _ in 0..500 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[tokio::test]
    async fn test_get_code_none_before_issue() {
        let db = test_db().await;
        let profile = new_profile(&db, "A").await;

        sqlx::query("DELETE FROM family_code")
            .execute(db.pool())
            .await
            .unwrap();
        assert_eq!(get_code(db.pool(), profile.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rotate_generates_new_code() {
        let db = test_db().await;
        let profile = new_profile(&db, "A").await;
        let before = profile.family_code.unwrap();

        let after = rotate(&db, profile.id, None).await.unwrap();
        assert!(is_well_formed(&after));
        assert_ne!(before, after);
        assert_eq!(get_code(db.pool(), profile.id).await.unwrap(), Some(after));
        assert_eq!(count_rows(&db, profile.id).await, 1);
    }

    #[tokio::test]
    async fn test_rotate_with_explicit_code() {
        let db = test_db().await;
        let profile = new_profile(&db, "A").await;

        let code = rotate(&db, profile.id, Some("  FAMILY-1 ")).await.unwrap();
        assert_eq!(code, "FAMILY-1");
        assert_eq!(count_rows(&db, profile.id).await, 1);

        // Same code again is fine for the same profile
        rotate(&db, profile.id, Some("FAMILY-1")).await.unwrap();
        assert_eq!(count_rows(&db, profile.id).await, 1);
    }

    #[tokio::test]
    async fn test_explicit_code_taken_by_other_profile() {
        let db = test_db().await;
        let first = new_profile(&db, "A").await;
        let second = new_profile(&db, "B").await;
        let second_code = second.family_code.clone().unwrap();

        let taken = first.family_code.unwrap();
        let result = rotate(&db, second.id, Some(&taken)).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // Rolled back: the second profile keeps its code
        assert_eq!(
            get_code(db.pool(), second.id).await.unwrap(),
            Some(second_code)
        );
    }

    #[tokio::test]
    async fn test_rotate_unknown_profile() {
        let db = test_db().await;
        let result = rotate(&db, 999, None).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_by_code() {
        let db = test_db().await;
        let profile = new_profile(&db, "A").await;
        let code = profile.family_code.clone().unwrap();

        let found = find_by_code(db.pool(), &code).await.unwrap();
        assert_eq!(found, profile);

        let missing = find_by_code(db.pool(), "YAO-00000000").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }
}
