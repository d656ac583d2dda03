//! Answer Collector — maps per-question option selections to answer letters.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::quiz::parser::Question;

/// Sent to the grading model for questions the user did not answer.
pub const UNANSWERED_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::A),
            1 => Some(Self::B),
            2 => Some(Self::C),
            3 => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("option index {index} is out of range for question {question_number} (A–D only)")]
    OptionOutOfRange {
        question_number: String,
        index: usize,
    },
}

/// Result of the pre-submission check. Incomplete is a normal outcome, not a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completion {
    Complete,
    Incomplete { answered: usize, expected: usize },
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }
}

/// Question number → selected letter. At most one answer per number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet {
    answers: BTreeMap<String, AnswerLetter>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the selection for a question; a later call for the same number wins.
    pub fn record_answer(
        &mut self,
        question_number: &str,
        option_index: usize,
    ) -> Result<AnswerLetter, AnswerError> {
        let letter =
            AnswerLetter::from_index(option_index).ok_or_else(|| AnswerError::OptionOutOfRange {
                question_number: question_number.to_string(),
                index: option_index,
            })?;
        self.answers.insert(question_number.to_string(), letter);
        Ok(letter)
    }

    pub fn get(&self, question_number: &str) -> Option<AnswerLetter> {
        self.answers.get(question_number).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn reset(&mut self) {
        self.answers.clear();
    }

    pub fn check_completion(&self, expected: usize) -> Completion {
        if self.answers.len() == expected {
            Completion::Complete
        } else {
            Completion::Incomplete {
                answered: self.answers.len(),
                expected,
            }
        }
    }

    /// JSON object sent to the grading model, one key per question in quiz order.
    pub fn grading_payload(&self, questions: &[Question]) -> Value {
        let mut payload = Map::new();
        for question in questions {
            let answer = self
                .get(&question.number)
                .map(AnswerLetter::as_str)
                .unwrap_or(UNANSWERED_PLACEHOLDER);
            payload.insert(question.number.clone(), Value::String(answer.to_string()));
        }
        // Answers keyed by numbers that are not in the quiz still go to the grader.
        for (number, letter) in &self.answers {
            if !payload.contains_key(number) {
                payload.insert(number.clone(), Value::String(letter.to_string()));
            }
        }
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::parser::parse_quiz;

    #[test]
    fn test_index_maps_to_letter() {
        let mut sheet = AnswerSheet::new();
        assert_eq!(sheet.record_answer("1", 0), Ok(AnswerLetter::A));
        assert_eq!(sheet.record_answer("2", 3), Ok(AnswerLetter::D));
        assert_eq!(sheet.get("2"), Some(AnswerLetter::D));
    }

    #[test]
    fn test_last_write_wins() {
        let mut sheet = AnswerSheet::new();
        for index in [0, 2, 1] {
            sheet.record_answer("1", index).unwrap();
        }
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.get("1"), Some(AnswerLetter::B));
    }

    #[test]
    fn test_out_of_range_index_is_rejected_and_not_recorded() {
        let mut sheet = AnswerSheet::new();
        let err = sheet.record_answer("1", 4).unwrap_err();
        assert_eq!(
            err,
            AnswerError::OptionOutOfRange {
                question_number: "1".to_string(),
                index: 4
            }
        );
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sheet = AnswerSheet::new();
        sheet.record_answer("1", 0).unwrap();
        sheet.record_answer("2", 1).unwrap();
        sheet.reset();
        assert!(sheet.is_empty());
        assert_eq!(sheet.get("1"), None);
    }

    #[test]
    fn test_completion_requires_exact_count() {
        let mut sheet = AnswerSheet::new();
        assert_eq!(
            sheet.check_completion(2),
            Completion::Incomplete {
                answered: 0,
                expected: 2
            }
        );
        sheet.record_answer("1", 0).unwrap();
        assert!(!sheet.check_completion(2).is_complete());
        sheet.record_answer("2", 1).unwrap();
        assert!(sheet.check_completion(2).is_complete());
    }

    #[test]
    fn test_empty_quiz_with_no_answers_is_complete() {
        assert!(AnswerSheet::new().check_completion(0).is_complete());
    }

    #[test]
    fn test_grading_payload_marks_unanswered() {
        let questions = parse_quiz("1. a\n○ x\n○ y\n\n2. b\n○ x\n○ y\n");
        let mut sheet = AnswerSheet::new();
        sheet.record_answer("2", 1).unwrap();

        let payload = sheet.grading_payload(&questions);
        assert_eq!(payload["1"], UNANSWERED_PLACEHOLDER);
        assert_eq!(payload["2"], "B");
    }

    #[test]
    fn test_sheet_serializes_as_plain_map() {
        let mut sheet = AnswerSheet::new();
        sheet.record_answer("1", 2).unwrap();
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json, serde_json::json!({"1": "C"}));
    }
}
