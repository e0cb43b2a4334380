use serde_json::Value;
use tokio_postgres::Row;
use tracing::{instrument, warn};

use crate::db::util::{db_error, parse_string_array, TimedClientExt};
use crate::db::PgPool;
use crate::{EducationLevel, JobPosting};

db_error!(JobPostingFetchError {});

const JOB_POSTING_COLUMNS: &str = "\
    id,\
    title,\
    min_experience_years,\
    min_education_level,\
    required_skills,\
    preferred_skills,\
    required_certifications,\
    screening_keywords,\
    experience_weight,\
    education_weight,\
    skills_weight,\
    certifications_weight,\
    keywords_weight,\
    min_screening_score,\
    auto_shortlist_threshold,\
    auto_reject_below_threshold,\
    enable_auto_screening";

#[instrument(skip(pool))]
pub async fn fetch_job_posting(
    pool: &PgPool,
    job_posting_id: i64,
) -> Result<Option<JobPosting>, JobPostingFetchError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_opt_cached(
            &format!("SELECT {JOB_POSTING_COLUMNS} FROM ats.job_postings WHERE id = $1"),
            &[&job_posting_id],
            "job_postings.fetch",
        )
        .await?;

    Ok(row.map(map_job_posting_row))
}

fn map_job_posting_row(row: Row) -> JobPosting {
    let min_education_level = row
        .get::<_, Option<String>>("min_education_level")
        .and_then(|token| {
            let parsed = EducationLevel::parse(&token);
            if parsed.is_none() {
                warn!(%token, "unknown min_education_level on job posting; ignoring");
            }
            parsed
        });

    JobPosting {
        id: Some(row.get("id")),
        title: row.get("title"),
        min_experience_years: row.get("min_experience_years"),
        min_education_level,
        required_skills: parse_string_array(row.get::<_, Option<Value>>("required_skills")),
        preferred_skills: parse_string_array(row.get::<_, Option<Value>>("preferred_skills")),
        required_certifications: parse_string_array(
            row.get::<_, Option<Value>>("required_certifications"),
        ),
        screening_keywords: parse_string_array(row.get::<_, Option<Value>>("screening_keywords")),
        experience_weight: row.get("experience_weight"),
        education_weight: row.get("education_weight"),
        skills_weight: row.get("skills_weight"),
        certifications_weight: row.get("certifications_weight"),
        keywords_weight: row.get("keywords_weight"),
        min_screening_score: row.get("min_screening_score"),
        auto_shortlist_threshold: row.get("auto_shortlist_threshold"),
        auto_reject_below_threshold: row
            .get::<_, Option<bool>>("auto_reject_below_threshold")
            .unwrap_or(false),
        enable_auto_screening: row
            .get::<_, Option<bool>>("enable_auto_screening")
            .unwrap_or(false),
    }
}
