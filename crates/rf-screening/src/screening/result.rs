use std::collections::HashMap;

use serde_json::Value;

use super::knockout::{evaluate_knockouts, KnockoutReason};
use super::policy::{classify, PolicyDecision, StageCommand};
use super::scoring::{ScoreBreakdown, ScoreCalculator};
use crate::{Candidate, JobPosting, ScreeningCriterion, ScreeningQuestion, ScreeningStatus};

/// Outcome of one screening run over in-memory inputs.
///
/// Built as a single immutable value and handed to the orchestrator, which
/// turns it into the stored row and executes the stage command afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningEvaluation {
    pub status: ScreeningStatus,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub breakdown: Option<ScoreBreakdown>,
    pub knockout_reasons: Vec<KnockoutReason>,
    pub notes: String,
    pub command: Option<StageCommand>,
}

/// Run the full screening sequence: knockout evaluation, weighted scoring,
/// threshold policy.
///
/// Knockout violations short-circuit to a failed result with a zero score
/// and no stage command; the score calculator and policy never run for a
/// knocked-out candidate.
pub fn run_screening(
    job: &JobPosting,
    candidate: &Candidate,
    criteria: &[ScreeningCriterion],
    questions: &[ScreeningQuestion],
    responses: &HashMap<String, Value>,
) -> ScreeningEvaluation {
    let knockout_reasons = evaluate_knockouts(candidate, criteria, questions, responses);
    if !knockout_reasons.is_empty() {
        let summary = knockout_reasons
            .iter()
            .map(KnockoutReason::describe)
            .collect::<Vec<_>>()
            .join("; ");
        return ScreeningEvaluation {
            status: ScreeningStatus::Failed,
            total_score: 0,
            max_score: 0,
            percentage: 0,
            breakdown: None,
            knockout_reasons,
            notes: format!("knocked out: {summary}"),
            command: None,
        };
    }

    let breakdown = ScoreCalculator::for_posting(job).calculate(job, candidate, questions, responses);
    let PolicyDecision {
        status,
        command,
        note,
    } = classify(breakdown.percentage, job);

    ScreeningEvaluation {
        status,
        total_score: breakdown.total,
        max_score: breakdown.max_possible,
        percentage: breakdown.percentage,
        knockout_reasons: vec![],
        notes: note,
        command,
        breakdown: Some(breakdown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CriterionImportance, CriterionType, ScreeningStatus};

    fn job() -> JobPosting {
        JobPosting {
            min_experience_years: Some(3),
            required_skills: vec!["Excel".into(), "SQL".into()],
            min_screening_score: Some(60),
            auto_shortlist_threshold: Some(80),
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

    fn knockout_criterion(value: &str) -> ScreeningCriterion {
        ScreeningCriterion {
            id: Some(1),
            job_posting_id: Some(1),
            criterion_type: CriterionType::ExperienceYears,
            importance: CriterionImportance::Knockout,
            value: value.to_string(),
            weight: 0,
            display_order: 0,
            is_active: true,
        }
    }

    #[test]
    fn knockout_short_circuits_to_zeroed_failure() {
        let evaluation = run_screening(
            &job(),
            &candidate(),
            &[knockout_criterion("10")],
            &[],
            &HashMap::new(),
        );

        assert_eq!(evaluation.status, ScreeningStatus::Failed);
        assert_eq!(evaluation.total_score, 0);
        assert_eq!(evaluation.percentage, 0);
        assert!(evaluation.breakdown.is_none());
        assert!(!evaluation.knockout_reasons.is_empty());
        assert_eq!(evaluation.command, None);
        assert!(evaluation.notes.starts_with("knocked out"));
    }

    #[test]
    fn knockout_ignores_thresholds_entirely() {
        let mut job = job();
        job.auto_reject_below_threshold = true;

        let evaluation = run_screening(
            &job,
            &candidate(),
            &[knockout_criterion("10")],
            &[],
            &HashMap::new(),
        );

        // Failed by knockout, not by policy: no reject command is issued.
        assert_eq!(evaluation.command, None);
    }

    #[test]
    fn clean_run_scores_and_classifies() {
        let evaluation = run_screening(&job(), &candidate(), &[], &[], &HashMap::new());

        assert_eq!(evaluation.status, ScreeningStatus::Passed);
        assert_eq!(evaluation.percentage, 78);
        assert_eq!(evaluation.total_score, 78);
        assert_eq!(evaluation.max_score, 100);
        assert_eq!(evaluation.command, None); // 78 < shortlist threshold 80
        assert!(evaluation.breakdown.is_some());
    }

    #[test]
    fn low_score_with_auto_reject_issues_command() {
        let mut job = job();
        job.auto_reject_below_threshold = true;
        let mut cand = candidate();
        cand.years_of_experience = Some(0.0);
        cand.skills = vec![];

        let evaluation = run_screening(&job, &cand, &[], &[], &HashMap::new());
        assert_eq!(evaluation.status, ScreeningStatus::Failed);
        assert_eq!(evaluation.command, Some(StageCommand::Reject));
    }

    #[test]
    fn identical_inputs_produce_identical_evaluations() {
        let first = run_screening(&job(), &candidate(), &[], &[], &HashMap::new());
        let second = run_screening(&job(), &candidate(), &[], &[], &HashMap::new());
        assert_eq!(first, second);
    }
}
