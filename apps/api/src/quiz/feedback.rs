//! Feedback Reconciler — parses model-graded feedback text.
//!
//! ```text
//! Score: 3 / 5 (60%)
//!
//! Q1: Correct
//! - Your answer: B
//! - Correct answer: B
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::quiz::parser::Question;

pub const SCORE_PLACEHOLDER: &str = "Score: 0 / 0 (0%)";
const HEADER_PREFIX: char = 'Q';
const DETAIL_MARKER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    /// Correct only when the text says "correct" and never "incorrect".
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("correct") && !text.contains("incorrect") {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub achieved: u32,
    pub total: u32,
    pub percent: f32,
}

impl Score {
    /// Reads `<achieved> / <total> (<percent>%)` from a summary line.
    /// The percentage is derived when the line omits it.
    pub fn parse(line: &str) -> Option<Self> {
        let (left, right) = line.split_once('/')?;
        let achieved = trailing_number(left)?;
        let right = right.trim_start();
        let total_digits = right.bytes().take_while(u8::is_ascii_digit).count();
        let total: u32 = right[..total_digits].parse().ok()?;

        let percent = right[total_digits..]
            .split_once('(')
            .and_then(|(_, inner)| inner.split_once('%'))
            .and_then(|(value, _)| value.trim().parse::<f32>().ok())
            .unwrap_or_else(|| {
                if total == 0 {
                    0.0
                } else {
                    achieved as f32 * 100.0 / total as f32
                }
            });

        Some(Score {
            achieved,
            total,
            percent,
        })
    }
}

fn trailing_number(text: &str) -> Option<u32> {
    let text = text.trim_end();
    let digits = text.bytes().rev().take_while(u8::is_ascii_digit).count();
    text[text.len() - digits..].parse().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Header token as written by the grader, e.g. "Q1".
    pub question_number: String,
    pub verdict: Verdict,
    pub verdict_text: String,
    pub detail_lines: Vec<String>,
}

impl FeedbackRecord {
    /// Value of a `Label: value` detail line, matched case-insensitively.
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.detail_lines.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(label)
                .then(|| value.trim())
        })
    }

    /// The header token without its `Q` prefix, for matching against question numbers.
    pub fn bare_number(&self) -> &str {
        self.question_number
            .strip_prefix(HEADER_PREFIX)
            .unwrap_or(&self.question_number)
            .trim()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub summary: String,
    pub score: Option<Score>,
    pub records: Vec<FeedbackRecord>,
}

impl FeedbackReport {
    pub fn correct_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.verdict == Verdict::Correct)
            .count()
    }

    /// Feedback numbers with no matching question. Order follows the feedback text.
    pub fn unmatched(&self, questions: &[Question]) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !questions.iter().any(|q| q.number == r.bare_number()))
            .map(|r| r.question_number.clone())
            .collect()
    }

    /// Logs a warning for any correlation mismatch; records are left untouched.
    pub fn warn_on_mismatch(&self, questions: &[Question]) {
        let unmatched = self.unmatched(questions);
        if !unmatched.is_empty() {
            warn!(
                ?unmatched,
                questions = questions.len(),
                "feedback refers to questions that are not in the quiz"
            );
        }
        if !self.records.is_empty() && self.records.len() != questions.len() {
            warn!(
                feedback = self.records.len(),
                questions = questions.len(),
                "feedback count differs from question count"
            );
        }
    }
}

/// Parses grading feedback. Text without header lines yields zero records.
pub fn parse_feedback(text: &str) -> FeedbackReport {
    let mut lines = text.lines();

    let summary = lines
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or(SCORE_PLACEHOLDER)
        .to_string();
    let score = Score::parse(&summary);
    if score.is_none() {
        debug!("score summary is not in the expected shape: {summary}");
    }

    let mut records = Vec::new();
    let mut current: Option<FeedbackRecord> = None;

    for line in lines.map(str::trim) {
        if let Some((token, rest)) = split_header(line) {
            records.extend(current.take());
            current = Some(FeedbackRecord {
                question_number: token.to_string(),
                verdict: Verdict::classify(rest),
                verdict_text: rest.to_string(),
                detail_lines: Vec::new(),
            });
        } else if let Some(detail) = line.strip_prefix(DETAIL_MARKER) {
            if let Some(record) = current.as_mut() {
                record.detail_lines.push(detail.trim().to_string());
            }
        }
    }
    records.extend(current);

    FeedbackReport {
        summary,
        score,
        records,
    }
}

fn split_header(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with(HEADER_PREFIX) {
        return None;
    }
    let (token, rest) = line.split_once(':')?;
    Some((token.trim(), rest.trim()))
}
