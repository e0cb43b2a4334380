use serde_json::Value;
use thiserror::Error;

use crate::QuestionType;

#[derive(Debug, Error)]
pub enum AnswerParseError {
    #[error("multiple-choice acceptable answer is not a JSON string array: {0}")]
    InvalidChoiceList(String),
    #[error("numeric acceptable answer is not a comparator, range or number: {0}")]
    InvalidNumeric(String),
}

/// Tagged form of the `acceptable_answer` column.
///
/// The raw column stores a plain string, a JSON-encoded array, or a
/// comparator string depending on the question type. Parsing happens once,
/// when configuration is loaded, so the evaluator never re-interprets text.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptableAnswer {
    /// yes/no, single-choice and date questions: one accepted token.
    Exact(String),
    /// multiple-choice: every selected token must be accepted (subset rule,
    /// not equality).
    AnyOf(Vec<String>),
    /// numeric `">=N"`
    AtLeast(f64),
    /// numeric `"<=N"`
    AtMost(f64),
    /// numeric `"min-max"`, inclusive on both ends
    Between(f64, f64),
    /// numeric with a bare number: exact equality
    ExactNumber(f64),
    /// free text: the response must contain at least one keyword
    Keywords(Vec<String>),
}

impl AcceptableAnswer {
    /// Parse the raw column for a question of the given type. `Ok(None)`
    /// means no constraint is configured (blank column); an `Err` is a
    /// configuration defect the loader downgrades to a warning.
    pub fn parse(
        question_type: QuestionType,
        raw: &str,
    ) -> Result<Option<Self>, AnswerParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        match question_type {
            QuestionType::YesNo | QuestionType::SingleChoice | QuestionType::Date => {
                Ok(Some(AcceptableAnswer::Exact(raw.to_string())))
            }
            QuestionType::MultipleChoice => {
                let tokens: Vec<String> = serde_json::from_str(raw)
                    .map_err(|err| AnswerParseError::InvalidChoiceList(err.to_string()))?;
                Ok(Some(AcceptableAnswer::AnyOf(tokens)))
            }
            QuestionType::Numeric => parse_numeric(raw).map(Some),
            QuestionType::FreeText => {
                let keywords: Vec<String> = raw
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                if keywords.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(AcceptableAnswer::Keywords(keywords)))
                }
            }
        }
    }

    /// Whether a response satisfies this constraint.
    pub fn accepts(&self, response: &Value) -> bool {
        match self {
            AcceptableAnswer::Exact(expected) => response_text(response)
                .map(|text| text.trim().eq_ignore_ascii_case(expected.trim()))
                .unwrap_or(false),
            AcceptableAnswer::AnyOf(accepted) => {
                let selected = response_tokens(response);
                !selected.is_empty()
                    && selected.iter().all(|token| {
                        accepted
                            .iter()
                            .any(|a| a.trim().eq_ignore_ascii_case(token.trim()))
                    })
            }
            AcceptableAnswer::AtLeast(min) => response_number(response)
                .map(|v| v >= *min)
                .unwrap_or(false),
            AcceptableAnswer::AtMost(max) => response_number(response)
                .map(|v| v <= *max)
                .unwrap_or(false),
            AcceptableAnswer::Between(lo, hi) => response_number(response)
                .map(|v| v >= *lo && v <= *hi)
                .unwrap_or(false),
            AcceptableAnswer::ExactNumber(expected) => response_number(response)
                .map(|v| (v - expected).abs() < f64::EPSILON)
                .unwrap_or(false),
            AcceptableAnswer::Keywords(keywords) => response_text(response)
                .map(|text| {
                    let haystack = text.to_lowercase();
                    keywords
                        .iter()
                        .any(|k| haystack.contains(&k.to_lowercase()))
                })
                .unwrap_or(false),
        }
    }

    /// Human-readable form used in knockout reasons.
    pub fn describe(&self) -> String {
        match self {
            AcceptableAnswer::Exact(expected) => expected.clone(),
            AcceptableAnswer::AnyOf(accepted) => format!("one of: {}", accepted.join(", ")),
            AcceptableAnswer::AtLeast(min) => format!(">= {min}"),
            AcceptableAnswer::AtMost(max) => format!("<= {max}"),
            AcceptableAnswer::Between(lo, hi) => format!("{lo}-{hi}"),
            AcceptableAnswer::ExactNumber(expected) => expected.to_string(),
            AcceptableAnswer::Keywords(keywords) => {
                format!("contains any of: {}", keywords.join(", "))
            }
        }
    }
}

fn parse_numeric(raw: &str) -> Result<AcceptableAnswer, AnswerParseError> {
    let invalid = || AnswerParseError::InvalidNumeric(raw.to_string());

    if let Some(rest) = raw.strip_prefix(">=") {
        return rest
            .trim()
            .parse()
            .map(AcceptableAnswer::AtLeast)
            .map_err(|_| invalid());
    }
    if let Some(rest) = raw.strip_prefix("<=") {
        return rest
            .trim()
            .parse()
            .map(AcceptableAnswer::AtMost)
            .map_err(|_| invalid());
    }
    if let Ok(value) = raw.parse::<f64>() {
        return Ok(AcceptableAnswer::ExactNumber(value));
    }
    if let Some((lo, hi)) = raw.split_once('-') {
        let lo: f64 = lo.trim().parse().map_err(|_| invalid())?;
        let hi: f64 = hi.trim().parse().map_err(|_| invalid())?;
        return Ok(AcceptableAnswer::Between(lo, hi));
    }
    Err(invalid())
}

/// A response counts as missing when it is absent, null, blank, or an empty
/// selection.
pub fn response_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Render a response for display in reasons and notes.
pub fn render_response(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_response)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn response_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        _ => None,
    }
}

fn response_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => vec![],
    }
}

fn response_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
