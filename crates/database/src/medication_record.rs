//! Adherence ledger.
//!
//! Check-ins are appended, never merged: one day may carry several records.
//! Whether medication was taken on a day is derived by the reader, with any
//! `done` record winning over `undone` ones regardless of order.

use schedule::clock::LOCAL_UTC_OFFSET_SECS;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{MedicationRecord, RecordStatus};
use crate::validation::{validate_id, validate_record_date};

/// SQLite date modifier shifting UTC to the local wall clock.
fn local_offset() -> String {
    format!("{} seconds", LOCAL_UTC_OFFSET_SECS)
}

/// Append a check-in for `record_date`.
///
/// `record_time` is stamped with the local wall clock at insertion.
pub async fn record(
    pool: &SqlitePool,
    elderly_id: i64,
    record_date: &str,
    status: RecordStatus,
) -> Result<MedicationRecord> {
    validate_id("elderly_id", elderly_id)?;
    let record_date = validate_record_date(record_date)?;
    let local_offset = local_offset();

    let record = sqlx::query_as::<_, MedicationRecord>(
        r#"
        INSERT INTO medication_record (elderly_id, record_date, status, record_time)
        VALUES (?, ?, ?, strftime('%H:%M', 'now', ?))
        RETURNING id, elderly_id, record_date, status, created_at, record_time,
            strftime('%m/%d %H:%M', created_at, ?) AS created_time
        "#,
    )
    .bind(elderly_id)
    .bind(&record_date)
    .bind(status)
    .bind(&local_offset)
    .bind(&local_offset)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::missing_parent(e, "Elderly", elderly_id))?;

    tracing::info!(
        elderly_id,
        record_id = record.id,
        record_date = %record.record_date,
        status = %status,
        "Recorded medication check-in"
    );

    Ok(record)
}

/// Change the status of one record in place.
pub async fn set_status(
    pool: &SqlitePool,
    record_id: i64,
    status: RecordStatus,
) -> Result<MedicationRecord> {
    validate_id("id", record_id)?;
    let local_offset = local_offset();

    let record = sqlx::query_as::<_, MedicationRecord>(
        r#"
        UPDATE medication_record
        SET status = ?
        WHERE id = ?
        RETURNING id, elderly_id, record_date, status, created_at, record_time,
            strftime('%m/%d %H:%M', created_at, ?) AS created_time
        "#,
    )
    .bind(status)
    .bind(record_id)
    .bind(local_offset)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "MedicationRecord",
        id: record_id.to_string(),
    })?;

    tracing::info!(record_id, status = %status, "Updated medication check-in");

    Ok(record)
}

/// All records for a profile, most recent first.
pub async fn list_for(pool: &SqlitePool, elderly_id: i64) -> Result<Vec<MedicationRecord>> {
    validate_id("elderly_id", elderly_id)?;

    let records = sqlx::query_as::<_, MedicationRecord>(
        r#"
        SELECT id, elderly_id, record_date, status, created_at, record_time,
            strftime('%m/%d %H:%M', created_at, ?) AS created_time
        FROM medication_record
        WHERE elderly_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(local_offset())
    .bind(elderly_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Whether any record for `date` (`YYYY-MM-DD`) claims `done`.
pub fn taken_on(records: &[MedicationRecord], date: &str) -> bool {
    records
        .iter()
        .any(|r| r.record_date == date && r.status == RecordStatus::Done)
}
