/// Per-posting screening criteria. Only knockout-importance rows affect the
/// screening outcome today; required/preferred rows are stored for future
/// use.
pub const SCREENING_CRITERIA_DDL: &str = r#"
CREATE TABLE ats.screening_criteria (
    id BIGSERIAL PRIMARY KEY,
    job_posting_id BIGINT NOT NULL,

    criterion_type VARCHAR(30) NOT NULL,
    importance VARCHAR(10) NOT NULL DEFAULT 'required',
    value TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0,

    display_order INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_criterion_type CHECK (criterion_type IN (
        'experience_years', 'education_level', 'skill_required', 'certification',
        'keyword', 'location', 'salary_expectation', 'availability', 'work_authorization'
    )),
    CONSTRAINT chk_importance CHECK (importance IN ('knockout', 'required', 'preferred'))
);

CREATE INDEX idx_screening_criteria_posting
    ON ats.screening_criteria(job_posting_id, display_order) WHERE is_active;
"#;

/// Per-posting screening questions. `acceptable_answer` is a plain string, a
/// JSON array (multiple choice) or a comparator string (numeric) depending on
/// `question_type`; it is parsed into a typed form at load.
pub const SCREENING_QUESTIONS_DDL: &str = r#"
CREATE TABLE ats.screening_questions (
    id BIGSERIAL PRIMARY KEY,
    job_posting_id BIGINT NOT NULL,

    question_text TEXT NOT NULL,
    question_type VARCHAR(20) NOT NULL,
    acceptable_answer TEXT,

    is_knockout BOOLEAN NOT NULL DEFAULT false,
    points INTEGER NOT NULL DEFAULT 0,
    is_required BOOLEAN NOT NULL DEFAULT false,

    display_order INTEGER NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_question_type CHECK (question_type IN (
        'yes_no', 'single_choice', 'multiple_choice', 'free_text', 'numeric', 'date'
    ))
);

CREATE INDEX idx_screening_questions_posting
    ON ats.screening_questions(job_posting_id, display_order) WHERE is_active;
"#;

/// One screening result per application, overwritten on re-screen (UPSERT on
/// application_id). `screening_run_id` records which process run last wrote
/// the row.
pub const SCREENING_RESULTS_DDL: &str = r#"
CREATE TABLE ats.screening_results (
    id BIGSERIAL PRIMARY KEY,
    application_id BIGINT NOT NULL UNIQUE,

    status VARCHAR(20) NOT NULL DEFAULT 'pending',
    total_score INTEGER NOT NULL DEFAULT 0,
    max_score INTEGER NOT NULL DEFAULT 0,
    percentage INTEGER NOT NULL DEFAULT 0,

    score_breakdown JSONB,
    knockout_reasons JSONB,
    question_responses JSONB,
    notes TEXT,

    screening_run_id VARCHAR(64),

    is_manual_override BOOLEAN NOT NULL DEFAULT false,
    override_reason TEXT,

    screened_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_screening_status CHECK (status IN (
        'pending', 'passed', 'failed', 'manual_review'
    )),
    CONSTRAINT chk_percentage CHECK (percentage >= 0 AND percentage <= 100)
);

CREATE INDEX idx_screening_results_status
    ON ats.screening_results(status, percentage DESC);
CREATE INDEX idx_screening_results_run
    ON ats.screening_results(screening_run_id) WHERE screening_run_id IS NOT NULL;
"#;
