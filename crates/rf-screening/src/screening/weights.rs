use crate::JobPosting;

/// Dimension weights applied when a posting leaves them unset. Intended to
/// sum to 100, but the sum is not enforced anywhere.
pub const DEFAULT_WEIGHTS: ScreeningWeights = ScreeningWeights {
    experience: 30,
    education: 15,
    skills: 30,
    certifications: 10,
    keywords: 15,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreeningWeights {
    pub experience: u32,
    pub education: u32,
    pub skills: u32,
    pub certifications: u32,
    pub keywords: u32,
}

impl ScreeningWeights {
    pub fn sum(&self) -> u32 {
        self.experience + self.education + self.skills + self.certifications + self.keywords
    }

    /// Resolve a posting's configured weights, falling back to the defaults
    /// per field. Negative values are treated as zero.
    pub fn for_posting(job: &JobPosting) -> Self {
        fn pick(configured: Option<i32>, default: u32) -> u32 {
            configured.map(|v| v.max(0) as u32).unwrap_or(default)
        }

        Self {
            experience: pick(job.experience_weight, DEFAULT_WEIGHTS.experience),
            education: pick(job.education_weight, DEFAULT_WEIGHTS.education),
            skills: pick(job.skills_weight, DEFAULT_WEIGHTS.skills),
            certifications: pick(job.certifications_weight, DEFAULT_WEIGHTS.certifications),
            keywords: pick(job.keywords_weight, DEFAULT_WEIGHTS.keywords),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sum_to_one_hundred() {
        assert_eq!(DEFAULT_WEIGHTS.sum(), 100);
    }

    #[test]
    fn posting_overrides_apply_per_field() {
        let job = JobPosting {
            skills_weight: Some(50),
            keywords_weight: Some(0),
            ..JobPosting::default()
        };

        let weights = ScreeningWeights::for_posting(&job);
        assert_eq!(weights.skills, 50);
        assert_eq!(weights.keywords, 0);
        assert_eq!(weights.experience, DEFAULT_WEIGHTS.experience);
    }

    #[test]
    fn negative_weights_clamp_to_zero() {
        let job = JobPosting {
            education_weight: Some(-10),
            ..JobPosting::default()
        };

        assert_eq!(ScreeningWeights::for_posting(&job).education, 0);
    }
}
