//! Default elderly binding for anonymous callers.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::UserSettings;
use crate::validation::{validate_caller_id, validate_id};

/// Caller token returned by [`ensure_caller_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerToken {
    pub value: String,
    /// True when the token was just created and must be handed back to the caller.
    pub minted: bool,
}

/// Reuse the caller's existing token or mint a new one.
pub fn ensure_caller_id(existing: Option<&str>) -> CallerToken {
    match existing.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => CallerToken {
            value: token.to_string(),
            minted: false,
        },
        None => CallerToken {
            value: Uuid::new_v4().to_string(),
            minted: true,
        },
    }
}

/// Get the caller's settings row.
pub async fn get_settings(pool: &SqlitePool, user_id: &str) -> Result<Option<UserSettings>> {
    let user_id = validate_caller_id(user_id)?;

    let record = sqlx::query_as::<_, UserSettings>(
        r#"
        SELECT user_id, default_elderly_id, updated_at
        FROM user_settings
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get the elderly profile the caller administers by default.
pub async fn get_default(pool: &SqlitePool, user_id: &str) -> Result<Option<i64>> {
    let settings = get_settings(pool, user_id).await?;
    Ok(settings.and_then(|s| s.default_elderly_id))
}

/// Create or update the caller's default elderly profile.
pub async fn set_default(
    pool: &SqlitePool,
    user_id: &str,
    elderly_id: i64,
) -> Result<UserSettings> {
    let user_id = validate_caller_id(user_id)?;
    validate_id("default_elderly_id", elderly_id)?;

    let settings = sqlx::query_as::<_, UserSettings>(
        r#"
        INSERT INTO user_settings (user_id, default_elderly_id)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            default_elderly_id = excluded.default_elderly_id,
            updated_at = datetime('now')
        RETURNING user_id, default_elderly_id, updated_at
        "#,
    )
    .bind(user_id)
    .bind(elderly_id)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::missing_parent(e, "Elderly", elderly_id))?;

    tracing::info!(elderly_id, "Saved default elderly binding");

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elderly;
    use crate::models::SaveProfile;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn new_profile(db: &Database, name: &str) -> i64 {
        elderly::save_profile(
            db,
            &SaveProfile {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    }

    #[test]
    fn test_ensure_caller_id() {
        let kept = ensure_caller_id(Some("abc"));
        assert_eq!(kept.value, "abc");
        assert!(!kept.minted);

        let minted = ensure_caller_id(None);
        assert!(minted.minted);
        assert!(Uuid::parse_str(&minted.value).is_ok());

        let blank = ensure_caller_id(Some("  "));
        assert!(blank.minted);
        assert_ne!(ensure_caller_id(None).value, minted.value);
    }

    #[tokio::test]
    async fn test_get_default_none() {
        let db = test_db().await;
        assert_eq!(get_default(db.pool(), "caller-1").await.unwrap(), None);
        assert!(get_settings(db.pool(), "caller-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_default_upserts() {
        let db = test_db().await;
        let first = new_profile(&db, "A").await;
        let second = new_profile(&db, "B").await;

        set_default(db.pool(), "caller-1", first).await.unwrap();
        let saved = set_default(db.pool(), "caller-1", second).await.unwrap();
        assert_eq!(saved.user_id, "caller-1");
        assert_eq!(saved.default_elderly_id, Some(second));

        assert_eq!(get_default(db.pool(), "caller-1").await.unwrap(), Some(second));

        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_settings WHERE user_id = 'caller-1'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_callers_are_independent() {
        let db = test_db().await;
        let first = new_profile(&db, "A").await;
        let second = new_profile(&db, "B").await;

        set_default(db.pool(), "caller-1", first).await.unwrap();
        set_default(db.pool(), "caller-2", second).await.unwrap();

        assert_eq!(get_default(db.pool(), "caller-1").await.unwrap(), Some(first));
        assert_eq!(get_default(db.pool(), "caller-2").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_set_default_validation() {
        let db = test_db().await;
        let elderly_id = new_profile(&db, "A").await;

        let result = set_default(db.pool(), "caller-1", 0).await;
        assert!(matches!(result, Err(DatabaseError::Invalid(_))));

        let result = set_default(db.pool(), "", elderly_id).await;
        assert!(matches!(result, Err(DatabaseError::Invalid(_))));

        let result = set_default(db.pool(), "caller-1", 999).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert_eq!(get_default(db.pool(), "caller-1").await.unwrap(), None);
    }
}
