pub mod db;
pub mod logging;
pub mod orchestrator;
pub mod run_id;
pub mod schema;
pub mod screening;

use chrono::{DateTime, Utc};

pub use screening::answers::AcceptableAnswer;

/// Education hierarchy used by both the knockout evaluator and the score
/// calculator. Ordering follows the declaration: any < high school < diploma
/// < bachelors < masters < phd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EducationLevel {
    Any,
    HighSchool,
    Diploma,
    Bachelors,
    Masters,
    Phd,
}

impl EducationLevel {
    pub fn rank(self) -> u32 {
        match self {
            EducationLevel::Any => 0,
            EducationLevel::HighSchool => 1,
            EducationLevel::Diploma => 2,
            EducationLevel::Bachelors => 3,
            EducationLevel::Masters => 4,
            EducationLevel::Phd => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::Any => "any",
            EducationLevel::HighSchool => "high_school",
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::Masters => "masters",
            EducationLevel::Phd => "phd",
        }
    }

    /// Accepts the stored tokens plus common spelling variants
    /// ("high-school", "Bachelor", "doctorate").
    pub fn parse(token: &str) -> Option<Self> {
        let normalized = token.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "any" => Some(EducationLevel::Any),
            "high_school" | "highschool" => Some(EducationLevel::HighSchool),
            "diploma" | "associate" => Some(EducationLevel::Diploma),
            "bachelors" | "bachelor" | "bachelors_degree" => Some(EducationLevel::Bachelors),
            "masters" | "master" | "masters_degree" => Some(EducationLevel::Masters),
            "phd" | "doctorate" => Some(EducationLevel::Phd),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionType {
    ExperienceYears,
    EducationLevel,
    SkillRequired,
    Certification,
    Keyword,
    Location,
    SalaryExpectation,
    Availability,
    WorkAuthorization,
}

impl CriterionType {
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionType::ExperienceYears => "experience_years",
            CriterionType::EducationLevel => "education_level",
            CriterionType::SkillRequired => "skill_required",
            CriterionType::Certification => "certification",
            CriterionType::Keyword => "keyword",
            CriterionType::Location => "location",
            CriterionType::SalaryExpectation => "salary_expectation",
            CriterionType::Availability => "availability",
            CriterionType::WorkAuthorization => "work_authorization",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "experience_years" => Some(CriterionType::ExperienceYears),
            "education_level" => Some(CriterionType::EducationLevel),
            "skill_required" => Some(CriterionType::SkillRequired),
            "certification" => Some(CriterionType::Certification),
            "keyword" => Some(CriterionType::Keyword),
            "location" => Some(CriterionType::Location),
            "salary_expectation" => Some(CriterionType::SalaryExpectation),
            "availability" => Some(CriterionType::Availability),
            "work_authorization" => Some(CriterionType::WorkAuthorization),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionImportance {
    Knockout,
    Required,
    Preferred,
}

impl CriterionImportance {
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionImportance::Knockout => "knockout",
            CriterionImportance::Required => "required",
            CriterionImportance::Preferred => "preferred",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "knockout" => Some(CriterionImportance::Knockout),
            "required" => Some(CriterionImportance::Required),
            "preferred" => Some(CriterionImportance::Preferred),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    YesNo,
    SingleChoice,
    MultipleChoice,
    FreeText,
    Numeric,
    Date,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::YesNo => "yes_no",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::FreeText => "free_text",
            QuestionType::Numeric => "numeric",
            QuestionType::Date => "date",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yes_no" | "yesno" => Some(QuestionType::YesNo),
            "single_choice" => Some(QuestionType::SingleChoice),
            "multiple_choice" => Some(QuestionType::MultipleChoice),
            "free_text" | "text" => Some(QuestionType::FreeText),
            "numeric" | "number" => Some(QuestionType::Numeric),
            "date" => Some(QuestionType::Date),
            _ => None,
        }
    }
}

/// Final classification of a screening result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningStatus {
    Pending,
    Passed,
    Failed,
    ManualReview,
}

impl ScreeningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreeningStatus::Pending => "pending",
            ScreeningStatus::Passed => "passed",
            ScreeningStatus::Failed => "failed",
            ScreeningStatus::ManualReview => "manual_review",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ScreeningStatus::Pending),
            "passed" => Some(ScreeningStatus::Passed),
            "failed" => Some(ScreeningStatus::Failed),
            "manual_review" => Some(ScreeningStatus::ManualReview),
            _ => None,
        }
    }
}

/// Pipeline stages the engine itself can move an application into. The full
/// stage set is owned by the surrounding workflow system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Screening,
    Rejected,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Screening => "screening",
            PipelineStage::Rejected => "rejected",
        }
    }
}

// Commonly used data models for the screening functions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub min_experience_years: Option<i32>,
    pub min_education_level: Option<EducationLevel>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub required_certifications: Vec<String>,
    pub screening_keywords: Vec<String>,
    pub experience_weight: Option<i32>,
    pub education_weight: Option<i32>,
    pub skills_weight: Option<i32>,
    pub certifications_weight: Option<i32>,
    pub keywords_weight: Option<i32>,
    pub min_screening_score: Option<i32>,
    pub auto_shortlist_threshold: Option<i32>,
    pub auto_reject_below_threshold: bool,
    pub enable_auto_screening: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub id: Option<i64>,
    pub years_of_experience: Option<f64>,
    pub education_level: Option<EducationLevel>,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub work_authorization: Option<String>,
    pub expected_salary: Option<i64>,
    pub resume_text: Option<String>,
    pub cover_letter: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Application {
    pub id: i64,
    pub job_posting_id: i64,
    pub candidate_id: i64,
    pub status: Option<String>,
    pub stage: Option<String>,
    pub match_score: Option<i32>,
    pub screened_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningCriterion {
    pub id: Option<i64>,
    pub job_posting_id: Option<i64>,
    pub criterion_type: CriterionType,
    pub importance: CriterionImportance,
    pub value: String,
    pub weight: i32,
    pub display_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningQuestion {
    pub id: Option<i64>,
    pub job_posting_id: Option<i64>,
    pub question_text: String,
    pub question_type: QuestionType,
    pub acceptable_answer: Option<AcceptableAnswer>,
    pub is_knockout: bool,
    pub points: i32,
    pub is_required: bool,
    pub display_order: i32,
    pub is_active: bool,
}
