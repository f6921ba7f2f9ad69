//! Elderly profiles and their medication plans.
//!
//! A save replaces the whole plan set of a profile: existing plans and their
//! times are deleted and the submitted plans are inserted with fresh IDs.
//! The sequence runs in one transaction under the profile lock.

use std::collections::HashMap;

use schedule::{format_time_of_day, parse_time_of_day, Medication};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::family_code;
use crate::models::{
    Elderly, ElderlyProfile, MedicationPlan, PlanInput, PlanRow, SaveProfile, TimeRow,
};
use crate::validation::{validate_family_code, validate_id, validate_name};
use crate::Database;

/// A submitted plan that passed filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AcceptedPlan {
    name: String,
    quantity: i64,
    unit: Option<String>,
    note: Option<String>,
    times: Vec<String>,
}

/// Keep plans with a medication name and a positive quantity.
///
/// Times are normalized to `HH:MM`; empty or unparseable ones are skipped.
fn accept_plans(plans: &[PlanInput]) -> Vec<AcceptedPlan> {
    let mut accepted = Vec::with_capacity(plans.len());

    for (index, plan) in plans.iter().enumerate() {
        let medication = plan.medication.clone().unwrap_or_default();
        let name = medication.name.unwrap_or_default().trim().to_string();
        let quantity = medication.quantity.unwrap_or(0);

        if name.is_empty() || quantity <= 0 {
            tracing::warn!(index, "Skipping plan without medication name or quantity");
            continue;
        }

        let mut times = Vec::with_capacity(plan.times.len());
        for raw in &plan.times {
            if raw.trim().is_empty() {
                continue;
            }
            match parse_time_of_day(raw) {
                Some(time) => times.push(format_time_of_day(time)),
                None => tracing::warn!(index, time = %raw, "Skipping unparseable plan time"),
            }
        }

        accepted.push(AcceptedPlan {
            name,
            quantity,
            unit: medication.unit.filter(|u| !u.trim().is_empty()),
            note: plan.note.clone().filter(|n| !n.trim().is_empty()),
            times,
        });
    }

    accepted
}

/// Get an elderly row by ID.
pub async fn get_elderly(pool: &SqlitePool, elderly_id: i64) -> Result<Elderly> {
    sqlx::query_as::<_, Elderly>(
        r#"
        SELECT id, name
        FROM elderly
        WHERE id = ?
        "#,
    )
    .bind(elderly_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Elderly",
        id: elderly_id.to_string(),
    })
}

/// Load a profile with its family code, plans and plan times.
///
/// Plans and times come back in creation order.
pub async fn get_profile(pool: &SqlitePool, elderly_id: i64) -> Result<ElderlyProfile> {
    validate_id("id", elderly_id)?;

    let elderly = get_elderly(pool, elderly_id).await?;
    let family_code = family_code::get_code(pool, elderly_id).await?;

    let plan_rows = sqlx::query_as::<_, PlanRow>(
        r#"
        SELECT id, elderly_id, med_name, quantity, unit, note
        FROM medication_plan
        WHERE elderly_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(elderly_id)
    .fetch_all(pool)
    .await?;

    let time_rows = sqlx::query_as::<_, TimeRow>(
        r#"
        SELECT t.plan_id, t.time_hhmm
        FROM medication_time t
        INNER JOIN medication_plan p ON p.id = t.plan_id
        WHERE p.elderly_id = ?
        ORDER BY t.id ASC
        "#,
    )
    .bind(elderly_id)
    .fetch_all(pool)
    .await?;

    let mut times_by_plan: HashMap<i64, Vec<String>> = HashMap::new();
    for row in time_rows {
        times_by_plan.entry(row.plan_id).or_default().push(row.time_hhmm);
    }

    let plans = plan_rows
        .into_iter()
        .map(|row| MedicationPlan {
            times: times_by_plan.remove(&row.id).unwrap_or_default(),
            id: row.id,
            elderly_id: row.elderly_id,
            medication: Medication {
                name: row.med_name,
                quantity: row.quantity,
                unit: row.unit,
            },
            note: row.note,
        })
        .collect();

    tracing::debug!(elderly_id, "Loaded elderly profile");

    Ok(ElderlyProfile {
        id: elderly.id,
        name: elderly.name,
        family_code,
        plans,
    })
}

/// Create or update a profile and replace its plan set.
///
/// The family code resolves as explicit, then existing, then freshly minted.
/// Only an empty name is rejected; plan entries that fail filtering and an
/// unusable explicit code are dropped. Returns the reloaded profile.
pub async fn save_profile(db: &Database, input: &SaveProfile) -> Result<ElderlyProfile> {
    let name = validate_name(&input.name)?;
    let explicit_code = match input.family_code.as_deref() {
        Some(code) if !code.trim().is_empty() => match validate_family_code(code) {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring explicit family code");
                None
            }
        },
        _ => None,
    };
    let plans = accept_plans(&input.plans);
    let existing_id = input.id.filter(|id| *id > 0);

    let _guard = match existing_id {
        Some(id) => Some(db.lock_elderly(id).await),
        None => None,
    };

    let mut tx = db.pool().begin().await?;

    let elderly_id = match existing_id {
        Some(id) => {
            rename_elderly(&mut tx, id, name).await?;
            id
        }
        None => insert_elderly(&mut tx, name).await?,
    };

    let code = match explicit_code {
        Some(code) => Some(code.to_string()),
        None => family_code::current_code(&mut tx, elderly_id).await?,
    };
    family_code::replace_code(&mut tx, elderly_id, code.as_deref()).await?;

    replace_plans(&mut tx, elderly_id, &plans).await?;

    tx.commit().await?;

    tracing::info!(
        elderly_id,
        submitted = input.plans.len(),
        saved = plans.len(),
        "Saved elderly profile"
    );

    get_profile(db.pool(), elderly_id).await
}

async fn insert_elderly(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO elderly (name)
        VALUES (?)
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

async fn rename_elderly(conn: &mut SqliteConnection, elderly_id: i64, name: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE elderly
        SET name = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(elderly_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Elderly",
            id: elderly_id.to_string(),
        });
    }

    Ok(())
}

/// Delete every plan of the profile (times cascade) and insert `plans`.
async fn replace_plans(
    conn: &mut SqliteConnection,
    elderly_id: i64,
    plans: &[AcceptedPlan],
) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM medication_plan
        WHERE elderly_id = ?
        "#,
    )
    .bind(elderly_id)
    .execute(&mut *conn)
    .await?;

    for plan in plans {
        let plan_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO medication_plan (elderly_id, med_name, quantity, unit, note)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(elderly_id)
        .bind(&plan.name)
        .bind(plan.quantity)
        .bind(&plan.unit)
        .bind(&plan.note)
        .fetch_one(&mut *conn)
        .await?;

        for time in &plan.times {
            sqlx::query(
                r#"
                INSERT INTO medication_time (plan_id, time_hhmm)
                VALUES (?, ?)
                "#,
            )
            .bind(plan_id)
            .bind(time)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}
