use chrono::{DateTime, Utc};
use deadpool_postgres::GenericClient;
use serde_json::Value;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::{instrument, warn};

use crate::db::util::{db_error, parse_string_array, TimedClientExt};
use crate::db::PgPool;
use crate::screening::policy::StageCommand;
use crate::{Application, Candidate, EducationLevel, PipelineStage, ScreeningStatus};

db_error!(ApplicationStorageError {});

/// An application joined with its candidate, the unit the screening engine
/// operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationContext {
    pub application: Application,
    pub candidate: Candidate,
}

/// Application id plus the status of its existing screening result, if any.
/// Drives the skip-already-screened rule in bulk runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationScreeningState {
    pub application_id: i64,
    pub result_status: Option<ScreeningStatus>,
}

#[instrument(skip(pool))]
pub async fn fetch_application_with_candidate(
    pool: &PgPool,
    application_id: i64,
) -> Result<Option<ApplicationContext>, ApplicationStorageError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            "SELECT
                a.id,
                a.job_posting_id,
                a.candidate_id,
                a.status,
                a.stage,
                a.match_score,
                a.screened_at,
                a.rejected_at,
                c.years_of_experience,
                c.education_level,
                c.skills,
                c.certifications,
                c.work_authorization,
                c.expected_salary,
                c.resume_text,
                c.cover_letter,
                c.current_title,
                c.current_company
            FROM ats.applications a
            JOIN ats.candidates c ON c.id = a.candidate_id
            WHERE a.id = $1",
            &[&application_id],
            "applications.fetch_with_candidate",
        )
        .await?;

    Ok(row.map(map_context_row))
}

/// All applications of a posting with their current result status, in id
/// order so bulk screening is deterministic.
#[instrument(skip(pool))]
pub async fn list_applications_for_posting(
    pool: &PgPool,
    job_posting_id: i64,
) -> Result<Vec<ApplicationScreeningState>, ApplicationStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT a.id, r.status
            FROM ats.applications a
            LEFT JOIN ats.screening_results r ON r.application_id = a.id
            WHERE a.job_posting_id = $1
            ORDER BY a.id",
            &[&job_posting_id],
            "applications.list_for_posting",
        )
        .await?;

    let states = rows
        .into_iter()
        .map(|row| {
            let result_status = row
                .get::<_, Option<String>>("status")
                .and_then(|token| {
                    let parsed = ScreeningStatus::parse(&token);
                    if parsed.is_none() {
                        warn!(%token, "unknown screening result status; treating as absent");
                    }
                    parsed
                });
            ApplicationScreeningState {
                application_id: row.get("id"),
                result_status,
            }
        })
        .collect();

    Ok(states)
}

/// Take the per-application row lock for the persistence-and-side-effect
/// step. Returns false when the application vanished.
pub async fn lock_application(
    client: &impl GenericClient,
    application_id: i64,
) -> Result<bool, PgError> {
    let row = client
        .timed_query_opt_cached(
            "SELECT id FROM ats.applications WHERE id = $1 FOR UPDATE",
            &[&application_id],
            "applications.lock",
        )
        .await?;
    Ok(row.is_some())
}

/// Refresh the cached match score used for sorting and filtering.
pub async fn update_match_score(
    client: &impl GenericClient,
    application_id: i64,
    match_score: i32,
) -> Result<u64, PgError> {
    client
        .timed_execute_cached(
            "UPDATE ats.applications SET match_score = $2, updated_at = NOW() WHERE id = $1",
            &[&application_id, &match_score],
            "applications.update_match_score",
        )
        .await
}

/// Execute a stage command issued by the screening policy.
pub async fn apply_stage_command(
    client: &impl GenericClient,
    application_id: i64,
    command: StageCommand,
    now: DateTime<Utc>,
) -> Result<u64, PgError> {
    match command {
        StageCommand::AdvanceToScreening => {
            client
                .timed_execute_cached(
                    "UPDATE ats.applications
                    SET stage = $2, screened_at = $3, updated_at = NOW()
                    WHERE id = $1",
                    &[&application_id, &PipelineStage::Screening.as_str(), &now],
                    "applications.advance_to_screening",
                )
                .await
        }
        StageCommand::Reject => {
            client
                .timed_execute_cached(
                    "UPDATE ats.applications
                    SET stage = $2, status = 'rejected', rejected_at = $3, updated_at = NOW()
                    WHERE id = $1",
                    &[&application_id, &PipelineStage::Rejected.as_str(), &now],
                    "applications.reject",
                )
                .await
        }
    }
}

fn map_context_row(row: Row) -> ApplicationContext {
    let education_level = row
        .get::<_, Option<String>>("education_level")
        .and_then(|token| {
            let parsed = EducationLevel::parse(&token);
            if parsed.is_none() {
                warn!(%token, "unknown candidate education level; treating as unset");
            }
            parsed
        });

    let application = Application {
        id: row.get("id"),
        job_posting_id: row.get("job_posting_id"),
        candidate_id: row.get("candidate_id"),
        status: row.get("status"),
        stage: row.get("stage"),
        match_score: row.get("match_score"),
        screened_at: row.get("screened_at"),
        rejected_at: row.get("rejected_at"),
    };

    let candidate = Candidate {
        id: Some(application.candidate_id),
        years_of_experience: row.get("years_of_experience"),
        education_level,
        skills: parse_string_array(row.get::<_, Option<Value>>("skills")),
        certifications: parse_string_array(row.get::<_, Option<Value>>("certifications")),
        work_authorization: row.get("work_authorization"),
        expected_salary: row.get("expected_salary"),
        resume_text: row.get("resume_text"),
        cover_letter: row.get("cover_letter"),
        current_title: row.get("current_title"),
        current_company: row.get("current_company"),
    };

    ApplicationContext {
        application,
        candidate,
    }
}
