pub mod applications;
pub mod criteria;
pub mod job_postings;
pub mod pool;
pub mod screening_results;
pub(crate) mod util;

// Keep re-exports unique so downstream code sees a single symbol per helper.
pub use applications::{
    apply_stage_command, fetch_application_with_candidate, list_applications_for_posting,
    lock_application, update_match_score, ApplicationContext, ApplicationScreeningState,
    ApplicationStorageError,
};
pub use criteria::{fetch_screening_criteria, fetch_screening_questions, CriteriaStorageError};
pub use job_postings::{fetch_job_posting, JobPostingFetchError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool};
pub use screening_results::{
    fetch_result_for_application, override_result_status, upsert_screening_result,
    ScreeningResultRecord, ScreeningResultStorageError, ScreeningResultUpsert,
};
