use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::answers::{render_response, response_is_empty};
use super::matchers::any_token_matches;
use crate::{
    Candidate, CriterionImportance, CriterionType, EducationLevel, ScreeningCriterion,
    ScreeningQuestion,
};

/// One failed knockout rule. Structured (rule / required / actual) so the
/// persisted JSONB stays queryable for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockoutReason {
    pub rule: String,
    pub required: String,
    pub actual: String,
}

impl KnockoutReason {
    pub fn describe(&self) -> String {
        format!("{}: required {}, got {}", self.rule, self.required, self.actual)
    }
}

/// Evaluate every knockout rule and collect all violations.
///
/// Never short-circuits mid-evaluation: a rejected candidate's result lists
/// everything that disqualified them, not just the first hit. Pure over its
/// inputs.
pub fn evaluate_knockouts(
    candidate: &Candidate,
    criteria: &[ScreeningCriterion],
    questions: &[ScreeningQuestion],
    responses: &HashMap<String, Value>,
) -> Vec<KnockoutReason> {
    let mut reasons = Vec::new();

    for criterion in criteria
        .iter()
        .filter(|c| c.is_active && c.importance == CriterionImportance::Knockout)
    {
        if let Some(reason) = check_criterion(criterion, candidate) {
            reasons.push(reason);
        }
    }

    for question in questions.iter().filter(|q| q.is_active && q.is_knockout) {
        if let Some(reason) = check_question(question, responses) {
            reasons.push(reason);
        }
    }

    reasons
}

/// Binary pass check for one question response. Shared with the question
/// points dimension of the score calculator, which reuses it unchanged.
pub fn answer_passes(question: &ScreeningQuestion, response: &Value) -> bool {
    match &question.acceptable_answer {
        Some(acceptable) => acceptable.accepts(response),
        // No constraint configured (or it was dropped as malformed at load):
        // any provided answer counts.
        None => true,
    }
}

fn check_criterion(
    criterion: &ScreeningCriterion,
    candidate: &Candidate,
) -> Option<KnockoutReason> {
    match criterion.criterion_type {
        CriterionType::ExperienceYears => {
            let required: f64 = match criterion.value.trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    warn!(
                        value = %criterion.value,
                        "unparseable experience-years criterion; skipping rule"
                    );
                    return None;
                }
            };
            let actual = candidate.years_of_experience.unwrap_or(0.0);
            (actual < required).then(|| KnockoutReason {
                rule: "experience_years".into(),
                required: format!("{required} years minimum"),
                actual: format!("{actual} years"),
            })
        }
        CriterionType::EducationLevel => {
            let required = match EducationLevel::parse(&criterion.value) {
                Some(level) => level,
                None => {
                    warn!(
                        value = %criterion.value,
                        "unknown education level in criterion; skipping rule"
                    );
                    return None;
                }
            };
            let actual = candidate.education_level.unwrap_or(EducationLevel::Any);
            (actual.rank() < required.rank()).then(|| KnockoutReason {
                rule: "education_level".into(),
                required: required.as_str().into(),
                actual: actual.as_str().into(),
            })
        }
        CriterionType::SkillRequired => {
            let token = criterion.value.trim();
            (!any_token_matches(&candidate.skills, token)).then(|| KnockoutReason {
                rule: "skill_required".into(),
                required: token.into(),
                actual: list_or_none(&candidate.skills),
            })
        }
        CriterionType::Certification => {
            let token = criterion.value.trim();
            (!any_token_matches(&candidate.certifications, token)).then(|| KnockoutReason {
                rule: "certification".into(),
                required: token.into(),
                actual: list_or_none(&candidate.certifications),
            })
        }
        CriterionType::WorkAuthorization => {
            let required = criterion.value.trim();
            let actual = candidate.work_authorization.as_deref().unwrap_or("").trim();
            (actual != required).then(|| KnockoutReason {
                rule: "work_authorization".into(),
                required: required.into(),
                actual: if actual.is_empty() {
                    "none".into()
                } else {
                    actual.into()
                },
            })
        }
        CriterionType::SalaryExpectation => {
            let (_, max) = match parse_salary_range(&criterion.value) {
                Some(range) => range,
                None => {
                    warn!(
                        value = %criterion.value,
                        "unparseable salary-expectation criterion; skipping rule"
                    );
                    return None;
                }
            };
            // Only an expectation above the configured maximum disqualifies;
            // a candidate without an expectation passes.
            let expected = candidate.expected_salary?;
            let max = max?;
            (expected > max).then(|| KnockoutReason {
                rule: "salary_expectation".into(),
                required: format!("at most {max}"),
                actual: expected.to_string(),
            })
        }
        CriterionType::Keyword | CriterionType::Location | CriterionType::Availability => {
            debug!(
                criterion_type = criterion.criterion_type.as_str(),
                "criterion type has no knockout rule; skipping"
            );
            None
        }
    }
}

fn check_question(
    question: &ScreeningQuestion,
    responses: &HashMap<String, Value>,
) -> Option<KnockoutReason> {
    let Some(id) = question.id else {
        debug!("knockout question without an id; skipping");
        return None;
    };

    let response = responses
        .get(&id.to_string())
        .filter(|v| !response_is_empty(v));

    let Some(response) = response else {
        if question.is_required {
            return Some(KnockoutReason {
                rule: question.question_text.clone(),
                required: "an answer".into(),
                actual: "not answered".into(),
            });
        }
        return None;
    };

    if answer_passes(question, response) {
        None
    } else {
        Some(KnockoutReason {
            rule: question.question_text.clone(),
            required: question
                .acceptable_answer
                .as_ref()
                .map(|a| a.describe())
                .unwrap_or_else(|| "an acceptable answer".into()),
            actual: render_response(response),
        })
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".into()
    } else {
        items.join(", ")
    }
}

/// Salary criterion values are stored as `"min-max"`; either end may be
/// blank. Returns `None` for values that fit neither form.
fn parse_salary_range(raw: &str) -> Option<(Option<i64>, Option<i64>)> {
    let raw = raw.trim();
    let (lo, hi) = raw.split_once('-')?;
    let lo = lo.trim();
    let hi = hi.trim();
    let min = if lo.is_empty() {
        None
    } else {
        Some(lo.parse().ok()?)
    };
    let max = if hi.is_empty() {
        None
    } else {
        Some(hi.parse().ok()?)
    };
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AcceptableAnswer, QuestionType};
    use serde_json::json;

    fn candidate() -> Candidate {
        Candidate {
            years_of_experience: Some(5.0),
            education_level: Some(EducationLevel::Bachelors),
            skills: vec!["Rust".into(), "PostgreSQL".into()],
            certifications: vec!["AWS Certified Developer".into()],
            work_authorization: Some("citizen".into()),
            expected_salary: Some(90_000),
            ..Candidate::default()
        }
    }

    fn criterion(criterion_type: CriterionType, value: &str) -> ScreeningCriterion {
        ScreeningCriterion {
            id: Some(1),
            job_posting_id: Some(1),
            criterion_type,
            importance: CriterionImportance::Knockout,
            value: value.to_string(),
            weight: 0,
            display_order: 0,
            is_active: true,
        }
    }

    fn question(
        id: i64,
        question_type: QuestionType,
        acceptable: Option<AcceptableAnswer>,
        is_required: bool,
    ) -> ScreeningQuestion {
        ScreeningQuestion {
            id: Some(id),
            job_posting_id: Some(1),
            question_text: format!("question {id}"),
            question_type,
            acceptable_answer: acceptable,
            is_knockout: true,
            points: 0,
            is_required,
            display_order: 0,
            is_active: true,
        }
    }

    #[test]
    fn clean_candidate_has_no_violations() {
        let criteria = vec![
            criterion(CriterionType::ExperienceYears, "3"),
            criterion(CriterionType::EducationLevel, "bachelors"),
            criterion(CriterionType::SkillRequired, "rust"),
            criterion(CriterionType::WorkAuthorization, "citizen"),
            criterion(CriterionType::SalaryExpectation, "60000-100000"),
        ];

        let reasons = evaluate_knockouts(&candidate(), &criteria, &[], &HashMap::new());
        assert!(reasons.is_empty());
    }

    #[test]
    fn collects_every_violation_without_short_circuiting() {
        let criteria = vec![
            criterion(CriterionType::ExperienceYears, "10"),
            criterion(CriterionType::EducationLevel, "phd"),
            criterion(CriterionType::SkillRequired, "Kubernetes"),
        ];

        let reasons = evaluate_knockouts(&candidate(), &criteria, &[], &HashMap::new());
        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0].rule, "experience_years");
        assert_eq!(reasons[1].rule, "education_level");
        assert_eq!(reasons[2].rule, "skill_required");
    }

    #[test]
    fn skill_matching_is_bidirectional_containment() {
        let mut cand = candidate();
        cand.skills = vec!["Microsoft Excel".into()];

        let reasons = evaluate_knockouts(
            &cand,
            &[criterion(CriterionType::SkillRequired, "excel")],
            &[],
            &HashMap::new(),
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn certification_mismatch_reports_required_and_actual() {
        let reasons = evaluate_knockouts(
            &candidate(),
            &[criterion(CriterionType::Certification, "PMP")],
            &[],
            &HashMap::new(),
        );

        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].required, "PMP");
        assert_eq!(reasons[0].actual, "AWS Certified Developer");
    }

    #[test]
    fn work_authorization_requires_exact_equality() {
        let reasons = evaluate_knockouts(
            &candidate(),
            &[criterion(CriterionType::WorkAuthorization, "Citizen")],
            &[],
            &HashMap::new(),
        );
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].rule, "work_authorization");
    }

    #[test]
    fn salary_violation_only_above_configured_max() {
        let over = criterion(CriterionType::SalaryExpectation, "50000-80000");
        let reasons = evaluate_knockouts(&candidate(), &[over.clone()], &[], &HashMap::new());
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].actual, "90000");

        // No expectation given: passes.
        let mut no_expectation = candidate();
        no_expectation.expected_salary = None;
        assert!(evaluate_knockouts(&no_expectation, &[over], &[], &HashMap::new()).is_empty());

        // No max configured: passes.
        let open_ended = criterion(CriterionType::SalaryExpectation, "50000-");
        assert!(evaluate_knockouts(&candidate(), &[open_ended], &[], &HashMap::new()).is_empty());
    }

    #[test]
    fn malformed_criterion_values_are_skipped() {
        let criteria = vec![
            criterion(CriterionType::ExperienceYears, "several"),
            criterion(CriterionType::EducationLevel, "bootcamp"),
            criterion(CriterionType::SalaryExpectation, "negotiable"),
        ];

        let reasons = evaluate_knockouts(&candidate(), &criteria, &[], &HashMap::new());
        assert!(reasons.is_empty());
    }

    #[test]
    fn inactive_and_non_knockout_criteria_are_ignored() {
        let mut inactive = criterion(CriterionType::ExperienceYears, "10");
        inactive.is_active = false;
        let mut preferred = criterion(CriterionType::SkillRequired, "Kubernetes");
        preferred.importance = CriterionImportance::Preferred;

        let reasons = evaluate_knockouts(&candidate(), &[inactive, preferred], &[], &HashMap::new());
        assert!(reasons.is_empty());
    }

    #[test]
    fn missing_required_response_is_a_violation() {
        let q = question(7, QuestionType::YesNo, Some(AcceptableAnswer::Exact("yes".into())), true);

        let reasons = evaluate_knockouts(&candidate(), &[], &[q], &HashMap::new());
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].actual, "not answered");
    }

    #[test]
    fn missing_optional_response_is_skipped() {
        let q = question(7, QuestionType::YesNo, Some(AcceptableAnswer::Exact("yes".into())), false);
        assert!(evaluate_knockouts(&candidate(), &[], &[q], &HashMap::new()).is_empty());
    }

    #[test]
    fn failing_answer_is_a_violation() {
        let q = question(7, QuestionType::YesNo, Some(AcceptableAnswer::Exact("yes".into())), true);
        let responses = HashMap::from([("7".to_string(), json!("no"))]);

        let reasons = evaluate_knockouts(&candidate(), &[], &[q], &responses);
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].required, "yes");
        assert_eq!(reasons[0].actual, "no");
    }

    #[test]
    fn multiple_choice_subset_rule_applies() {
        let q = question(
            3,
            QuestionType::MultipleChoice,
            Some(AcceptableAnswer::AnyOf(vec!["weekdays".into(), "weekends".into()])),
            true,
        );

        let ok = HashMap::from([("3".to_string(), json!(["weekdays"]))]);
        assert!(evaluate_knockouts(&candidate(), &[], &[q.clone()], &ok).is_empty());

        let bad = HashMap::from([("3".to_string(), json!(["weekdays", "nights"]))]);
        assert_eq!(evaluate_knockouts(&candidate(), &[], &[q], &bad).len(), 1);
    }

    #[test]
    fn numeric_range_answers_are_checked() {
        let q = question(
            4,
            QuestionType::Numeric,
            Some(AcceptableAnswer::Between(2.0, 5.0)),
            true,
        );

        let ok = HashMap::from([("4".to_string(), json!("3"))]);
        assert!(evaluate_knockouts(&candidate(), &[], &[q.clone()], &ok).is_empty());

        let bad = HashMap::from([("4".to_string(), json!("7"))]);
        assert_eq!(evaluate_knockouts(&candidate(), &[], &[q], &bad).len(), 1);
    }

    #[test]
    fn non_knockout_questions_are_never_evaluated_here() {
        let mut q = question(9, QuestionType::YesNo, Some(AcceptableAnswer::Exact("yes".into())), true);
        q.is_knockout = false;

        assert!(evaluate_knockouts(&candidate(), &[], &[q], &HashMap::new()).is_empty());
    }

    #[test]
    fn unconstrained_question_accepts_any_answer() {
        let q = question(5, QuestionType::FreeText, None, true);
        let responses = HashMap::from([("5".to_string(), json!("anything at all"))]);

        assert!(evaluate_knockouts(&candidate(), &[], &[q], &responses).is_empty());
    }
}
