use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::db::{
    self, ApplicationStorageError, CriteriaStorageError, JobPostingFetchError, PgPool,
    ScreeningResultRecord, ScreeningResultStorageError, ScreeningResultUpsert,
};
use crate::run_id;
use crate::screening::knockout::KnockoutReason;
use crate::screening::result::{run_screening, ScreeningEvaluation};
use crate::{JobPosting, ScreeningStatus};

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error("application not found: {0}")]
    ApplicationNotFound(i64),
    #[error("job posting not found: {0}")]
    JobPostingNotFound(i64),
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error(transparent)]
    Applications(#[from] ApplicationStorageError),
    #[error(transparent)]
    JobPostings(#[from] JobPostingFetchError),
    #[error(transparent)]
    Criteria(#[from] CriteriaStorageError),
    #[error(transparent)]
    Results(#[from] ScreeningResultStorageError),
}

/// Counters returned by a bulk screening run. Errored applications are
/// logged and excluded from all three counters; a later re-run picks them up
/// again because their result is still pending or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkScreeningSummary {
    pub screened: u32,
    pub passed: u32,
    pub failed: u32,
}

/// Facade tying together the criteria store, the pure screening engine and
/// the result store, plus the stage-transition side effects.
pub struct ScreeningService {
    pool: PgPool,
}

impl ScreeningService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Screen one application end to end: load, evaluate, persist, then
    /// apply any stage transition. Re-screening overwrites the previous
    /// result row. When no response map is given, the responses stored on
    /// the previous result are reused so a re-run is reproducible.
    #[instrument(skip(self, question_responses))]
    pub async fn screen_application(
        &self,
        application_id: i64,
        question_responses: Option<HashMap<String, Value>>,
    ) -> Result<ScreeningResultRecord, ScreeningError> {
        let context = db::fetch_application_with_candidate(&self.pool, application_id)
            .await?
            .ok_or(ScreeningError::ApplicationNotFound(application_id))?;

        let job_posting_id = context.application.job_posting_id;
        let job = db::fetch_job_posting(&self.pool, job_posting_id)
            .await?
            .ok_or(ScreeningError::JobPostingNotFound(job_posting_id))?;

        let criteria = db::fetch_screening_criteria(&self.pool, job_posting_id).await?;
        let questions = db::fetch_screening_questions(&self.pool, job_posting_id).await?;

        let responses = match question_responses {
            Some(map) => map,
            None => self.stored_responses(application_id).await?,
        };

        let evaluation = run_screening(&job, &context.candidate, &criteria, &questions, &responses);
        self.persist(&job, application_id, &evaluation, &responses)
            .await
    }

    /// Screen every application of a posting that does not yet have a
    /// non-pending result. Sequential by design: stage transitions touch
    /// shared per-stage state and stay easy to reason about when serialized.
    /// One application's failure never stops the batch.
    #[instrument(skip(self))]
    pub async fn screen_all_applications(
        &self,
        job_posting_id: i64,
    ) -> Result<BulkScreeningSummary, ScreeningError> {
        db::fetch_job_posting(&self.pool, job_posting_id)
            .await?
            .ok_or(ScreeningError::JobPostingNotFound(job_posting_id))?;

        let states = db::list_applications_for_posting(&self.pool, job_posting_id).await?;

        let mut summary = BulkScreeningSummary::default();
        for state in states {
            if !should_screen(state.result_status) {
                debug!(
                    application_id = state.application_id,
                    "already screened; skipping"
                );
                continue;
            }

            match self.screen_application(state.application_id, None).await {
                Ok(record) => tally(&mut summary, record.status),
                Err(err) => warn!(
                    application_id = state.application_id,
                    error = %err,
                    "screening failed; continuing batch"
                ),
            }
        }

        info!(
            job_posting_id,
            run_id = run_id::get(),
            screened = summary.screened,
            passed = summary.passed,
            failed = summary.failed,
            "bulk screening finished"
        );
        Ok(summary)
    }

    /// Record a human decision on a result. Bypasses the policy entirely and
    /// triggers no stage transition; the row is flagged for audit.
    #[instrument(skip(self, reason))]
    pub async fn override_result(
        &self,
        result_id: i64,
        new_status: ScreeningStatus,
        reason: &str,
    ) -> Result<ScreeningResultRecord, ScreeningError> {
        let record = db::override_result_status(&self.pool, result_id, new_status, reason).await?;
        info!(result_id, status = new_status.as_str(), "manual override recorded");
        Ok(record)
    }

    async fn stored_responses(
        &self,
        application_id: i64,
    ) -> Result<HashMap<String, Value>, ScreeningError> {
        let existing = db::fetch_result_for_application(&self.pool, application_id).await?;
        Ok(responses_from_value(
            existing.and_then(|record| record.question_responses),
        ))
    }

    /// Persistence and side effects share one transaction holding the
    /// application row lock, so concurrent re-screens of the same
    /// application serialize instead of losing updates. The result row is
    /// written before any stage transition: a failing side effect cannot
    /// corrupt the score record.
    async fn persist(
        &self,
        job: &JobPosting,
        application_id: i64,
        evaluation: &ScreeningEvaluation,
        responses: &HashMap<String, Value>,
    ) -> Result<ScreeningResultRecord, ScreeningError> {
        let now = Utc::now();
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        if !db::lock_application(&tx, application_id).await? {
            return Err(ScreeningError::ApplicationNotFound(application_id));
        }

        let upsert = ScreeningResultUpsert {
            application_id,
            status: evaluation.status.as_str(),
            total_score: evaluation.total_score as i32,
            max_score: evaluation.max_score as i32,
            percentage: evaluation.percentage as i32,
            score_breakdown: evaluation
                .breakdown
                .as_ref()
                .and_then(|b| serde_json::to_value(b).ok()),
            knockout_reasons: knockout_reasons_json(&evaluation.knockout_reasons),
            question_responses: responses_json(responses),
            notes: Some(evaluation.notes.clone()),
            screening_run_id: Some(run_id::get().to_string()),
            screened_at: Some(now),
        };

        let record = db::upsert_screening_result(&tx, &upsert).await?;
        db::update_match_score(&tx, application_id, evaluation.percentage as i32).await?;

        if let Some(command) = evaluation.command {
            if job.enable_auto_screening {
                db::apply_stage_command(&tx, application_id, command, now).await?;
                info!(application_id, ?command, "stage transition applied");
            } else {
                debug!(
                    application_id,
                    "auto screening disabled on posting; stage command skipped"
                );
            }
        }

        tx.commit().await?;
        Ok(record)
    }
}

/// Bulk runs only touch applications with no result yet or a still-pending
/// one; anything already screened keeps its outcome (idempotent re-run).
fn should_screen(result_status: Option<ScreeningStatus>) -> bool {
    !result_status.is_some_and(|status| status != ScreeningStatus::Pending)
}

fn tally(summary: &mut BulkScreeningSummary, status: ScreeningStatus) {
    summary.screened += 1;
    match status {
        ScreeningStatus::Passed => summary.passed += 1,
        ScreeningStatus::Failed => summary.failed += 1,
        ScreeningStatus::Pending | ScreeningStatus::ManualReview => {}
    }
}

fn knockout_reasons_json(reasons: &[KnockoutReason]) -> Option<Value> {
    if reasons.is_empty() {
        None
    } else {
        serde_json::to_value(reasons).ok()
    }
}

fn responses_json(responses: &HashMap<String, Value>) -> Option<Value> {
    if responses.is_empty() {
        None
    } else {
        Some(Value::Object(
            responses
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ))
    }
}

fn responses_from_value(value: Option<Value>) -> HashMap<String, Value> {
    match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}
