use tokio_postgres::Row;
use tracing::{instrument, warn};

use crate::db::util::{db_error, TimedClientExt};
use crate::db::PgPool;
use crate::screening::answers::AcceptableAnswer;
use crate::{
    CriterionImportance, CriterionType, QuestionType, ScreeningCriterion, ScreeningQuestion,
};

db_error!(CriteriaStorageError {});

/// Active screening criteria for a posting, in display order. Rows with an
/// unknown type or importance token are configuration defects: they are
/// skipped with a warning so one bad row cannot block a pipeline.
#[instrument(skip(pool))]
pub async fn fetch_screening_criteria(
    pool: &PgPool,
    job_posting_id: i64,
) -> Result<Vec<ScreeningCriterion>, CriteriaStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, job_posting_id, criterion_type, importance, value, weight, display_order, is_active
            FROM ats.screening_criteria
            WHERE job_posting_id = $1 AND is_active = true
            ORDER BY display_order, id",
            &[&job_posting_id],
            "criteria.fetch",
        )
        .await?;

    Ok(rows.into_iter().filter_map(map_criterion_row).collect())
}

/// Active screening questions for a posting, in display order. A malformed
/// `acceptable_answer` disables that one matching rule (the question keeps
/// its required-answer semantics) rather than failing the load.
#[instrument(skip(pool))]
pub async fn fetch_screening_questions(
    pool: &PgPool,
    job_posting_id: i64,
) -> Result<Vec<ScreeningQuestion>, CriteriaStorageError> {
    let client = pool.get().await?;

    let rows = client
        .timed_query_cached(
            "SELECT id, job_posting_id, question_text, question_type, acceptable_answer,
                is_knockout, points, is_required, display_order, is_active
            FROM ats.screening_questions
            WHERE job_posting_id = $1 AND is_active = true
            ORDER BY display_order, id",
            &[&job_posting_id],
            "questions.fetch",
        )
        .await?;

    Ok(rows.into_iter().filter_map(map_question_row).collect())
}

fn map_criterion_row(row: Row) -> Option<ScreeningCriterion> {
    let id: i64 = row.get("id");

    let type_token: String = row.get("criterion_type");
    let Some(criterion_type) = CriterionType::parse(&type_token) else {
        warn!(criterion_id = id, token = %type_token, "unknown criterion type; skipping row");
        return None;
    };

    let importance_token: String = row.get("importance");
    let Some(importance) = CriterionImportance::parse(&importance_token) else {
        warn!(criterion_id = id, token = %importance_token, "unknown criterion importance; skipping row");
        return None;
    };

    Some(ScreeningCriterion {
        id: Some(id),
        job_posting_id: row.get("job_posting_id"),
        criterion_type,
        importance,
        value: row.get::<_, Option<String>>("value").unwrap_or_default(),
        weight: row.get::<_, Option<i32>>("weight").unwrap_or(0),
        display_order: row.get::<_, Option<i32>>("display_order").unwrap_or(0),
        is_active: true,
    })
}

fn map_question_row(row: Row) -> Option<ScreeningQuestion> {
    let id: i64 = row.get("id");

    let type_token: String = row.get("question_type");
    let Some(question_type) = QuestionType::parse(&type_token) else {
        warn!(question_id = id, token = %type_token, "unknown question type; skipping row");
        return None;
    };

    let acceptable_answer = row
        .get::<_, Option<String>>("acceptable_answer")
        .and_then(|raw| match AcceptableAnswer::parse(question_type, &raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(
                    question_id = id,
                    error = %err,
                    "malformed acceptable answer; matching rule disabled"
                );
                None
            }
        });

    Some(ScreeningQuestion {
        id: Some(id),
        job_posting_id: row.get("job_posting_id"),
        question_text: row.get("question_text"),
        question_type,
        acceptable_answer,
        is_knockout: row.get::<_, Option<bool>>("is_knockout").unwrap_or(false),
        points: row.get::<_, Option<i32>>("points").unwrap_or(0),
        is_required: row.get::<_, Option<bool>>("is_required").unwrap_or(false),
        display_order: row.get::<_, Option<i32>>("display_order").unwrap_or(0),
        is_active: true,
    })
}
