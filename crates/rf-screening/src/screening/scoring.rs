use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::answers::response_is_empty;
use super::knockout::answer_passes;
use super::matchers::partition_matches;
use super::weights::ScreeningWeights;
use crate::{Candidate, EducationLevel, JobPosting, ScreeningQuestion};

/// Score and supporting detail for one dimension. `matched` / `missing`
/// carry the token lists for skills, certifications and keywords, and the
/// question texts for the points dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: u32,
    pub max: u32,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl DimensionScore {
    fn plain(score: u32, max: u32, detail: impl Into<String>) -> Self {
        Self {
            score,
            max,
            detail: detail.into(),
            matched: vec![],
            missing: vec![],
        }
    }
}

/// Full weighted breakdown. Persisted as JSONB on the screening result and
/// kept for audit and UI display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub experience: DimensionScore,
    pub education: DimensionScore,
    pub skills: DimensionScore,
    pub certifications: DimensionScore,
    pub keywords: DimensionScore,
    pub questions: DimensionScore,
    pub total: u32,
    pub max_possible: u32,
    pub percentage: u32,
}

pub struct ScoreCalculator {
    weights: ScreeningWeights,
}

impl ScoreCalculator {
    pub fn new(weights: ScreeningWeights) -> Self {
        Self { weights }
    }

    pub fn for_posting(job: &JobPosting) -> Self {
        Self::new(ScreeningWeights::for_posting(job))
    }

    /// Compute the weighted multi-dimensional score. Independent of knockout
    /// status; the caller decides whether this ever runs.
    pub fn calculate(
        &self,
        job: &JobPosting,
        candidate: &Candidate,
        questions: &[ScreeningQuestion],
        responses: &HashMap<String, Value>,
    ) -> ScoreBreakdown {
        let experience = self.score_experience(job, candidate);
        let education = self.score_education(job, candidate);
        let skills = self.score_skills(job, candidate);
        let certifications = self.score_certifications(job, candidate);
        let keywords = self.score_keywords(job, candidate);
        let question_points = score_questions(questions, responses);

        let total = experience.score
            + education.score
            + skills.score
            + certifications.score
            + keywords.score
            + question_points.score;
        let max_possible = experience.max
            + education.max
            + skills.max
            + certifications.max
            + keywords.max
            + question_points.max;
        let percentage = if max_possible == 0 {
            0
        } else {
            scaled(100, total as f64 / max_possible as f64)
        };

        ScoreBreakdown {
            experience,
            education,
            skills,
            certifications,
            keywords,
            questions: question_points,
            total,
            max_possible,
            percentage,
        }
    }

    fn score_experience(&self, job: &JobPosting, candidate: &Candidate) -> DimensionScore {
        let weight = self.weights.experience;
        let Some(required) = job.min_experience_years else {
            return DimensionScore::plain(
                half(weight),
                weight,
                "no experience requirement; neutral credit",
            );
        };

        let required = required.max(0) as f64;
        let actual = candidate.years_of_experience.unwrap_or(0.0);
        if actual >= required {
            DimensionScore::plain(
                weight,
                weight,
                format!("meets minimum: {actual:.1} >= {required:.0} years"),
            )
        } else {
            // required > 0 here, since actual >= 0 always meets a 0 minimum.
            let ratio = (actual / required).clamp(0.0, 1.0);
            DimensionScore::plain(
                scaled(weight, ratio),
                weight,
                format!("below minimum: {actual:.1} < {required:.0} years"),
            )
        }
    }

    fn score_education(&self, job: &JobPosting, candidate: &Candidate) -> DimensionScore {
        let weight = self.weights.education;
        let required = match job.min_education_level {
            None => {
                return DimensionScore::plain(
                    half(weight),
                    weight,
                    "no education requirement; neutral credit",
                );
            }
            Some(EducationLevel::Any) => {
                return DimensionScore::plain(weight, weight, "any education accepted");
            }
            Some(level) => level,
        };

        let actual = candidate.education_level.unwrap_or(EducationLevel::Any);
        if actual.rank() >= required.rank() {
            DimensionScore::plain(
                weight,
                weight,
                format!("{} meets required {}", actual.as_str(), required.as_str()),
            )
        } else {
            let ratio = actual.rank() as f64 / required.rank() as f64;
            DimensionScore::plain(
                scaled(weight, ratio),
                weight,
                format!("{} below required {}", actual.as_str(), required.as_str()),
            )
        }
    }

    fn score_skills(&self, job: &JobPosting, candidate: &Candidate) -> DimensionScore {
        let weight = self.weights.skills;
        if job.required_skills.is_empty() {
            return DimensionScore::plain(
                half(weight),
                weight,
                "no required skills; neutral credit",
            );
        }

        let (matched, missing) = partition_matches(&job.required_skills, &candidate.skills);
        let ratio = matched.len() as f64 / job.required_skills.len() as f64;
        DimensionScore {
            score: scaled(weight, ratio),
            max: weight,
            detail: format!(
                "{} of {} required skills matched",
                matched.len(),
                job.required_skills.len()
            ),
            matched,
            missing,
        }
    }

    fn score_certifications(&self, job: &JobPosting, candidate: &Candidate) -> DimensionScore {
        let weight = self.weights.certifications;
        if job.required_certifications.is_empty() {
            // Unlike skills, an empty certification requirement earns full
            // credit rather than half.
            return DimensionScore::plain(
                weight,
                weight,
                "no required certifications; full credit",
            );
        }

        let (matched, missing) =
            partition_matches(&job.required_certifications, &candidate.certifications);
        let ratio = matched.len() as f64 / job.required_certifications.len() as f64;
        DimensionScore {
            score: scaled(weight, ratio),
            max: weight,
            detail: format!(
                "{} of {} required certifications matched",
                matched.len(),
                job.required_certifications.len()
            ),
            matched,
            missing,
        }
    }

    fn score_keywords(&self, job: &JobPosting, candidate: &Candidate) -> DimensionScore {
        let weight = self.weights.keywords;
        if job.screening_keywords.is_empty() {
            return DimensionScore::plain(weight, weight, "no screening keywords; full credit");
        }

        let haystack = searchable_text(candidate);
        let mut matched = Vec::new();
        let mut missing = Vec::new();
        for keyword in &job.screening_keywords {
            if haystack.contains(&keyword.trim().to_lowercase()) {
                matched.push(keyword.clone());
            } else {
                missing.push(keyword.clone());
            }
        }

        let ratio = matched.len() as f64 / job.screening_keywords.len() as f64;
        DimensionScore {
            score: scaled(weight, ratio),
            max: weight,
            detail: format!(
                "{} of {} keywords found",
                matched.len(),
                job.screening_keywords.len()
            ),
            matched,
            missing,
        }
    }
}

/// Points from non-knockout questions. Reuses the knockout pass/fail check as
/// a binary gate: full points or nothing, no partial credit. The max always
/// counts every non-knockout question's points, answered or not.
fn score_questions(
    questions: &[ScreeningQuestion],
    responses: &HashMap<String, Value>,
) -> DimensionScore {
    let mut score = 0u32;
    let mut max = 0u32;
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for question in questions.iter().filter(|q| q.is_active && !q.is_knockout) {
        let points = question.points.max(0) as u32;
        max += points;

        let response = question
            .id
            .and_then(|id| responses.get(&id.to_string()))
            .filter(|v| !response_is_empty(v));

        match response {
            Some(response) if answer_passes(question, response) => {
                score += points;
                matched.push(question.question_text.clone());
            }
            _ => missing.push(question.question_text.clone()),
        }
    }

    DimensionScore {
        score,
        max,
        detail: format!("{score} of {max} question points earned"),
        matched,
        missing,
    }
}

/// One lower-cased blob over every searchable candidate field, so keyword
/// containment checks run once per keyword.
fn searchable_text(candidate: &Candidate) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(resume) = candidate.resume_text.as_deref() {
        parts.push(resume);
    }
    if let Some(cover) = candidate.cover_letter.as_deref() {
        parts.push(cover);
    }
    for skill in &candidate.skills {
        parts.push(skill);
    }
    if let Some(title) = candidate.current_title.as_deref() {
        parts.push(title);
    }
    if let Some(company) = candidate.current_company.as_deref() {
        parts.push(company);
    }
    parts.join(" ").to_lowercase()
}

fn scaled(weight: u32, ratio: f64) -> u32 {
    (weight as f64 * ratio).round() as u32
}

fn half(weight: u32) -> u32 {
    scaled(weight, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AcceptableAnswer, QuestionType};
    use serde_json::json;

    fn job() -> JobPosting {
        JobPosting {
            min_experience_years: Some(3),
            required_skills: vec!["Excel".into(), "SQL".into()],
            ..JobPosting::default()
        }
    }

    fn candidate() -> Candidate {
        Candidate {
            years_of_experience: Some(3.0),
            skills: vec!["excel".into(), "python".into()],
            ..Candidate::default()
        }
    }

    fn points_question(id: i64, points: i32) -> ScreeningQuestion {
        ScreeningQuestion {
            id: Some(id),
            job_posting_id: Some(1),
            question_text: format!("question {id}"),
            question_type: QuestionType::YesNo,
            acceptable_answer: Some(AcceptableAnswer::Exact("yes".into())),
            is_knockout: false,
            points,
            is_required: false,
            display_order: 0,
            is_active: true,
        }
    }

    #[test]
    fn worked_example_scores_seventy_eight_percent() {
        let calculator = ScoreCalculator::for_posting(&job());
        let breakdown = calculator.calculate(&job(), &candidate(), &[], &HashMap::new());

        assert_eq!(breakdown.experience.score, 30); // meets minimum exactly
        assert_eq!(breakdown.education.score, 8); // no requirement: 7.5 rounded
        assert_eq!(breakdown.skills.score, 15); // 1 of 2 matched
        assert_eq!(breakdown.certifications.score, 10); // none required: full
        assert_eq!(breakdown.keywords.score, 15); // none configured: full
        assert_eq!(breakdown.total, 78);
        assert_eq!(breakdown.max_possible, 100);
        assert_eq!(breakdown.percentage, 78);
    }

    #[test]
    fn experience_partial_credit_scales_by_ratio() {
        let mut job = job();
        job.min_experience_years = Some(6);
        let mut cand = candidate();
        cand.years_of_experience = Some(3.0);

        let breakdown =
            ScoreCalculator::for_posting(&job).calculate(&job, &cand, &[], &HashMap::new());
        assert_eq!(breakdown.experience.score, 15); // 30 * 3/6
        assert!(breakdown.experience.detail.contains("below minimum"));
    }

    #[test]
    fn missing_candidate_experience_scores_zero_not_panic() {
        let mut cand = candidate();
        cand.years_of_experience = None;

        let breakdown =
            ScoreCalculator::for_posting(&job()).calculate(&job(), &cand, &[], &HashMap::new());
        assert_eq!(breakdown.experience.score, 0);
    }

    #[test]
    fn education_any_gets_full_weight() {
        let mut job = job();
        job.min_education_level = Some(EducationLevel::Any);

        let breakdown =
            ScoreCalculator::for_posting(&job).calculate(&job, &candidate(), &[], &HashMap::new());
        assert_eq!(breakdown.education.score, 15);
    }

    #[test]
    fn education_partial_credit_uses_hierarchy_ratio() {
        let mut job = job();
        job.min_education_level = Some(EducationLevel::Bachelors);
        let mut cand = candidate();
        cand.education_level = Some(EducationLevel::Diploma);

        let breakdown =
            ScoreCalculator::for_posting(&job).calculate(&job, &cand, &[], &HashMap::new());
        assert_eq!(breakdown.education.score, 10); // 15 * 2/3
    }

    #[test]
    fn empty_skills_requirement_is_half_but_certifications_full() {
        let mut job = job();
        job.required_skills = vec![];
        job.required_certifications = vec![];

        let breakdown =
            ScoreCalculator::for_posting(&job).calculate(&job, &candidate(), &[], &HashMap::new());
        assert_eq!(breakdown.skills.score, 15); // half of 30
        assert_eq!(breakdown.certifications.score, 10); // full 10
    }

    #[test]
    fn skills_breakdown_lists_matched_and_missing() {
        let breakdown = ScoreCalculator::for_posting(&job()).calculate(
            &job(),
            &candidate(),
            &[],
            &HashMap::new(),
        );

        assert_eq!(breakdown.skills.matched, vec!["Excel"]);
        assert_eq!(breakdown.skills.missing, vec!["SQL"]);
    }

    #[test]
    fn keywords_search_resume_title_company_and_skills() {
        let mut job = job();
        job.screening_keywords = vec!["fintech".into(), "python".into(), "Kafka".into()];
        let mut cand = candidate();
        cand.resume_text = Some("Built FinTech pipelines".into());
        cand.current_title = Some("Data Engineer".into());

        let breakdown =
            ScoreCalculator::for_posting(&job).calculate(&job, &cand, &[], &HashMap::new());
        // fintech via resume, python via the skill list; Kafka nowhere.
        assert_eq!(breakdown.keywords.matched, vec!["fintech", "python"]);
        assert_eq!(breakdown.keywords.missing, vec!["Kafka"]);
        assert_eq!(breakdown.keywords.score, 10); // 15 * 2/3
    }

    #[test]
    fn question_points_are_all_or_nothing() {
        let questions = vec![points_question(1, 10), points_question(2, 5)];
        let responses = HashMap::from([
            ("1".to_string(), json!("yes")),
            ("2".to_string(), json!("no")),
        ]);

        let breakdown = ScoreCalculator::for_posting(&job()).calculate(
            &job(),
            &candidate(),
            &questions,
            &responses,
        );

        assert_eq!(breakdown.questions.score, 10);
        assert_eq!(breakdown.questions.max, 15);
        assert_eq!(breakdown.max_possible, 115);
    }

    #[test]
    fn unanswered_questions_still_count_toward_max() {
        let questions = vec![points_question(1, 10)];

        let breakdown = ScoreCalculator::for_posting(&job()).calculate(
            &job(),
            &candidate(),
            &questions,
            &HashMap::new(),
        );

        assert_eq!(breakdown.questions.score, 0);
        assert_eq!(breakdown.questions.max, 10);
        assert_eq!(breakdown.questions.missing, vec!["question 1"]);
    }

    #[test]
    fn knockout_questions_earn_no_points() {
        let mut q = points_question(1, 10);
        q.is_knockout = true;
        let responses = HashMap::from([("1".to_string(), json!("yes"))]);

        let breakdown = ScoreCalculator::for_posting(&job()).calculate(
            &job(),
            &candidate(),
            &[q],
            &responses,
        );
        assert_eq!(breakdown.questions.max, 0);
        assert_eq!(breakdown.questions.score, 0);
    }

    #[test]
    fn zero_denominator_yields_zero_percentage() {
        let job = JobPosting {
            experience_weight: Some(0),
            education_weight: Some(0),
            skills_weight: Some(0),
            certifications_weight: Some(0),
            keywords_weight: Some(0),
            ..JobPosting::default()
        };

        let breakdown = ScoreCalculator::for_posting(&job).calculate(
            &job,
            &candidate(),
            &[],
            &HashMap::new(),
        );
        assert_eq!(breakdown.max_possible, 0);
        assert_eq!(breakdown.percentage, 0);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        let mut cand = candidate();
        cand.years_of_experience = Some(20.0);
        cand.skills = vec!["excel".into(), "sql".into()];

        let breakdown =
            ScoreCalculator::for_posting(&job()).calculate(&job(), &cand, &[], &HashMap::new());
        assert!(breakdown.percentage <= 100);
    }

    #[test]
    fn breakdown_serializes_for_jsonb_storage() {
        let breakdown = ScoreCalculator::for_posting(&job()).calculate(
            &job(),
            &candidate(),
            &[],
            &HashMap::new(),
        );

        let value = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(value["percentage"], 78);
        assert_eq!(value["skills"]["matched"][0], "Excel");

        let round_tripped: ScoreBreakdown = serde_json::from_value(value).unwrap();
        assert_eq!(round_tripped, breakdown);
    }
}
