use chrono::{DateTime, Utc};
use deadpool_postgres::GenericClient;
use serde_json::Value;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::{db_error, normalize_json, TimedClientExt};
use crate::db::PgPool;
use crate::ScreeningStatus;

db_error!(ScreeningResultStorageError {
    #[error("screening result not found: {0}")]
    NotFound(i64),
    #[error("failed to map screening result row: {0}")]
    Mapping(String),
});

/// Stored screening result row, one per application.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningResultRecord {
    pub id: i64,
    pub application_id: i64,
    pub status: ScreeningStatus,
    pub total_score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub score_breakdown: Option<Value>,
    pub knockout_reasons: Option<Value>,
    pub question_responses: Option<Value>,
    pub notes: Option<String>,
    pub screening_run_id: Option<String>,
    pub is_manual_override: bool,
    pub override_reason: Option<String>,
    pub screened_at: Option<DateTime<Utc>>,
}

/// Payload for the create-or-replace write.
#[derive(Debug, Clone, Default)]
pub struct ScreeningResultUpsert {
    pub application_id: i64,
    pub status: &'static str,
    pub total_score: i32,
    pub max_score: i32,
    pub percentage: i32,
    pub score_breakdown: Option<Value>,
    pub knockout_reasons: Option<Value>,
    pub question_responses: Option<Value>,
    pub notes: Option<String>,
    pub screening_run_id: Option<String>,
    pub screened_at: Option<DateTime<Utc>>,
}

const RESULT_COLUMNS: &str = "\
    id,\
    application_id,\
    status,\
    total_score,\
    max_score,\
    percentage,\
    score_breakdown,\
    knockout_reasons,\
    question_responses,\
    notes,\
    screening_run_id,\
    is_manual_override,\
    override_reason,\
    screened_at";

/// Create-or-replace the single result row for an application. A re-screen
/// replaces any earlier outcome, including a manual override: the fresh
/// automatic result stands until a human overrides it again.
///
/// Takes a client rather than the pool so it can run on the orchestrator's
/// transaction, inside the application row lock.
#[instrument(skip(client, result))]
pub async fn upsert_screening_result(
    client: &impl GenericClient,
    result: &ScreeningResultUpsert,
) -> Result<ScreeningResultRecord, ScreeningResultStorageError> {
    let row = client
        .timed_query_one_cached(
            &format!(
                "INSERT INTO ats.screening_results (
                    application_id,
                    status,
                    total_score,
                    max_score,
                    percentage,
                    score_breakdown,
                    knockout_reasons,
                    question_responses,
                    notes,
                    screening_run_id,
                    is_manual_override,
                    override_reason,
                    screened_at
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, false, NULL, $11
                )
                ON CONFLICT (application_id) DO UPDATE SET
                    status = EXCLUDED.status,
                    total_score = EXCLUDED.total_score,
                    max_score = EXCLUDED.max_score,
                    percentage = EXCLUDED.percentage,
                    score_breakdown = EXCLUDED.score_breakdown,
                    knockout_reasons = EXCLUDED.knockout_reasons,
                    question_responses = EXCLUDED.question_responses,
                    notes = EXCLUDED.notes,
                    screening_run_id = EXCLUDED.screening_run_id,
                    is_manual_override = false,
                    override_reason = NULL,
                    screened_at = EXCLUDED.screened_at,
                    updated_at = NOW()
                RETURNING {RESULT_COLUMNS}"
            ),
            &[
                &result.application_id,
                &result.status,
                &result.total_score,
                &result.max_score,
                &result.percentage,
                &normalize_json(&result.score_breakdown),
                &normalize_json(&result.knockout_reasons),
                &normalize_json(&result.question_responses),
                &result.notes,
                &result.screening_run_id,
                &result.screened_at,
            ],
            "screening_results.upsert",
        )
        .await?;

    map_result_row(row)
}

#[instrument(skip(pool))]
pub async fn fetch_result_for_application(
    pool: &PgPool,
    application_id: i64,
) -> Result<Option<ScreeningResultRecord>, ScreeningResultStorageError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            &format!(
                "SELECT {RESULT_COLUMNS} FROM ats.screening_results WHERE application_id = $1"
            ),
            &[&application_id],
            "screening_results.fetch_for_application",
        )
        .await?;

    row.map(map_result_row).transpose()
}

/// Record a human decision on an existing result. The status is replaced
/// outright and the row is flagged for audit; no stage transition follows.
#[instrument(skip(pool, reason))]
pub async fn override_result_status(
    pool: &PgPool,
    result_id: i64,
    status: ScreeningStatus,
    reason: &str,
) -> Result<ScreeningResultRecord, ScreeningResultStorageError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            &format!(
                "UPDATE ats.screening_results SET
                    status = $2,
                    is_manual_override = true,
                    override_reason = $3,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {RESULT_COLUMNS}"
            ),
            &[&result_id, &status.as_str(), &reason],
            "screening_results.override",
        )
        .await?
        .ok_or(ScreeningResultStorageError::NotFound(result_id))?;

    map_result_row(row)
}

fn map_result_row(row: Row) -> Result<ScreeningResultRecord, ScreeningResultStorageError> {
    let status_token: String = row.get("status");
    let status = ScreeningStatus::parse(&status_token).ok_or_else(|| {
        ScreeningResultStorageError::Mapping(format!("unknown status token: {status_token}"))
    })?;

    Ok(ScreeningResultRecord {
        id: row.get("id"),
        application_id: row.get("application_id"),
        status,
        total_score: row.get("total_score"),
        max_score: row.get("max_score"),
        percentage: row.get("percentage"),
        score_breakdown: row.get("score_breakdown"),
        knockout_reasons: row.get("knockout_reasons"),
        question_responses: row.get("question_responses"),
        notes: row.get("notes"),
        screening_run_id: row.get("screening_run_id"),
        is_manual_override: row.get("is_manual_override"),
        override_reason: row.get("override_reason"),
        screened_at: row.get("screened_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_defaults_are_empty() {
        let upsert = ScreeningResultUpsert {
            application_id: 7,
            status: ScreeningStatus::Pending.as_str(),
            ..Default::default()
        };

        assert_eq!(upsert.application_id, 7);
        assert!(upsert.score_breakdown.is_none());
        assert!(upsert.screened_at.is_none());
    }
}
