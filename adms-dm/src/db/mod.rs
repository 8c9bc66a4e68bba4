//! Database access layer for adms-dm
//!
//! The service only reads: it loads the application rows once at startup to
//! hydrate the caches, and never writes or re-queries during reconciliation.

use adms_common::models::ApplicationRow;
use adms_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Connect to the admissions database in read-only mode
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::Config(format!(
            "Database not found: {}",
            db_path.display()
        )));
    }

    // mode=ro: this service must never write to the source of truth
    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePool::connect(&db_url).await?;
    Ok(pool)
}

/// Load every application row for cache hydration
pub async fn fetch_applications(pool: &SqlitePool) -> Result<Vec<ApplicationRow>> {
    let records = sqlx::query(
        "SELECT id, application_number, full_name, email, phone,
                nrc_number, passport_number, program, intake, institution,
                status, payment_status, application_fee, paid_amount,
                result_slip_url, pop_url, created_at, submitted_at,
                updated_at, user_id
         FROM applications
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(records.iter().map(application_from_record).collect())
}

/// Total row count, logged at startup for hydration sanity checking
pub async fn count_applications(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Map a database record to the shared row model.
///
/// Unrecognized status strings degrade to `None` (the draft default) so a
/// bad row cannot fail the whole hydration load.
fn application_from_record(record: &SqliteRow) -> ApplicationRow {
    ApplicationRow {
        id: record.get("id"),
        application_number: record.try_get("application_number").ok(),
        full_name: record.try_get("full_name").ok(),
        email: record.try_get("email").ok(),
        phone: record.try_get("phone").ok(),
        nrc_number: record.try_get("nrc_number").ok(),
        passport_number: record.try_get("passport_number").ok(),
        program: record.try_get("program").ok(),
        intake: record.try_get("intake").ok(),
        institution: record.try_get("institution").ok(),
        status: record
            .try_get::<Option<String>, _>("status")
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok()),
        payment_status: record
            .try_get::<Option<String>, _>("payment_status")
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok()),
        application_fee: record.try_get("application_fee").ok().flatten(),
        paid_amount: record.try_get("paid_amount").ok().flatten(),
        result_slip_url: record.try_get("result_slip_url").ok(),
        pop_url: record.try_get("pop_url").ok(),
        created_at: record.try_get("created_at").ok(),
        submitted_at: record.try_get("submitted_at").ok(),
        updated_at: record.try_get("updated_at").ok(),
        user_id: record.try_get("user_id").ok(),
    }
}
