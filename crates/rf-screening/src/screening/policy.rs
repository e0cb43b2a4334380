use crate::{JobPosting, ScreeningStatus};

/// Stage transition requested by the policy. Pure data: the orchestrator
/// executes commands after the result row has been persisted, so a failed
/// side effect never corrupts the score record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageCommand {
    AdvanceToScreening,
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyDecision {
    pub status: ScreeningStatus,
    pub command: Option<StageCommand>,
    pub note: String,
}

/// Classify a computed percentage against the posting's thresholds.
///
/// Knockout failures never reach this function; the orchestrator
/// short-circuits them to a failed result first.
pub fn classify(percentage: u32, job: &JobPosting) -> PolicyDecision {
    let pass_mark = job.min_screening_score.unwrap_or(0).max(0) as u32;

    if percentage >= pass_mark {
        let shortlist_at = job
            .auto_shortlist_threshold
            .map(|t| t.max(0) as u32)
            .filter(|t| percentage >= *t);

        return match shortlist_at {
            Some(threshold) => PolicyDecision {
                status: ScreeningStatus::Passed,
                command: Some(StageCommand::AdvanceToScreening),
                note: format!(
                    "score {percentage}% at or above shortlist threshold {threshold}%; advancing to screening stage"
                ),
            },
            None => PolicyDecision {
                status: ScreeningStatus::Passed,
                command: None,
                note: format!(
                    "score {percentage}% passed minimum {pass_mark}%; pending manual review"
                ),
            },
        };
    }

    if job.auto_reject_below_threshold {
        PolicyDecision {
            status: ScreeningStatus::Failed,
            command: Some(StageCommand::Reject),
            note: format!("score {percentage}% below minimum {pass_mark}%; auto-rejected"),
        }
    } else {
        PolicyDecision {
            status: ScreeningStatus::Failed,
            command: None,
            note: format!("score {percentage}% below minimum {pass_mark}%"),
        }
    }
}
