//! Token matching shared by the knockout evaluator and the score calculator.
//!
//! Skills and certifications match on case-insensitive containment in either
//! direction, so "Excel" matches a candidate's "Microsoft Excel" and
//! "React.js" matches a required "React".

/// Case-insensitive bidirectional substring match. Blank tokens never match.
pub fn tokens_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Whether any entry of the candidate's list matches the required token.
pub fn any_token_matches(held: &[String], token: &str) -> bool {
    held.iter().any(|h| tokens_match(h, token))
}

/// Partition the required tokens into (matched, missing) against the
/// candidate's list, preserving the required order.
pub fn partition_matches(required: &[String], held: &[String]) -> (Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for token in required {
        if any_token_matches(held, token) {
            matched.push(token.clone());
        } else {
            missing.push(token.clone());
        }
    }
    (matched, missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_in_both_directions() {
        assert!(tokens_match("Excel", "Microsoft Excel"));
        assert!(tokens_match("Microsoft Excel", "excel"));
        assert!(tokens_match("react", "React.js"));
        assert!(!tokens_match("Go", "Rust"));
    }

    #[test]
    fn blank_tokens_never_match() {
        assert!(!tokens_match("", "anything"));
        assert!(!tokens_match("anything", "  "));
    }

    #[test]
    fn partitions_matched_and_missing() {
        let required = vec!["Excel".to_string(), "SQL".to_string()];
        let held = vec!["excel".to_string(), "python".to_string()];

        let (matched, missing) = partition_matches(&required, &held);
        assert_eq!(matched, vec!["Excel"]);
        assert_eq!(missing, vec!["SQL"]);
    }
}
