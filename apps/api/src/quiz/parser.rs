//! Quiz Text Parser — turns free-form quiz text from the LLM into `Question` records.
//!
//! Expected shape (a convention, not a schema):
//!
//! ```text
//! 1. 来月
//! ○ らいげつ
//! ○ らいがつ
//!
//! 2. ほん____よみます
//! ○ を
//! ○ に
//! ```
//!
//! Parsing is total: malformed blocks are dropped, never reported as errors.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Leading character of an option line.
pub const OPTION_MARKER: char = '○';
/// Options beyond this count are dropped, which keeps answers within A–D.
pub const MAX_OPTIONS: usize = 4;
/// A question with fewer options cannot be answered meaningfully.
pub const MIN_USABLE_OPTIONS: usize = 2;

/// One parsed multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Number token exactly as written in the source ("1", "07", …).
    pub number: String,
    pub prompt_text: String,
    /// Order determines the answer letter: first → A, second → B.
    pub options: Vec<String>,
}

impl Question {
    pub fn is_usable(&self) -> bool {
        self.options.len() >= MIN_USABLE_OPTIONS
    }

    /// Options paired with their answer letter, for rendering.
    pub fn labelled_options(&self) -> impl Iterator<Item = (char, &str)> {
        ('A'..='Z')
            .zip(self.options.iter())
            .map(|(letter, option)| (letter, option.as_str()))
    }
}

#[derive(Debug)]
struct PendingQuestion {
    number: String,
    prompt_text: String,
    options: Vec<String>,
}

impl PendingQuestion {
    fn push_option(&mut self, option: &str) {
        if self.options.len() < MAX_OPTIONS {
            self.options.push(option.to_string());
        } else {
            debug!(
                question = %self.number,
                "dropping option beyond the first {MAX_OPTIONS}: {option}"
            );
        }
    }

    fn into_question(self) -> Option<Question> {
        if self.options.is_empty() {
            debug!(question = %self.number, "dropping question without options");
            return None;
        }
        if self.prompt_text.is_empty() {
            debug!(question = %self.number, "dropping question without prompt text");
            return None;
        }
        Some(Question {
            number: self.number,
            prompt_text: self.prompt_text,
            options: self.options,
        })
    }
}

/// Parses raw quiz text into questions, in source order.
///
/// Duplicate numbers are kept. Empty input yields an empty vector.
pub fn parse_quiz(text: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut pending: Option<PendingQuestion> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            // Only a question that already has options is closed by a blank line;
            // a prompt followed by a blank line may still collect options below.
            if pending.as_ref().is_some_and(|p| !p.options.is_empty()) {
                flush(&mut pending, &mut questions);
            }
            continue;
        }

        if let Some((number, prompt_text)) = split_question_line(line) {
            flush(&mut pending, &mut questions);
            pending = Some(PendingQuestion {
                number: number.to_string(),
                prompt_text: prompt_text.to_string(),
                options: Vec::new(),
            });
        } else if let Some(option) = line.strip_prefix(OPTION_MARKER) {
            let option = option.trim();
            if option.is_empty() {
                continue;
            }
            match pending.as_mut() {
                Some(p) => p.push_option(option),
                None => debug!("ignoring option outside of a question: {option}"),
            }
        }
    }

    flush(&mut pending, &mut questions);
    questions
}

fn flush(pending: &mut Option<PendingQuestion>, out: &mut Vec<Question>) {
    if let Some(question) = pending.take().and_then(PendingQuestion::into_question) {
        out.push(question);
    }
}

/// Splits `"12. prompt"` into `("12", "prompt")`. Requires at least one digit
/// immediately followed by a period; full-width digits (`１２.`) count too.
fn split_question_line(line: &str) -> Option<(&str, &str)> {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_numeric())
        .map_or(line.len(), |(i, _)| i);
    if end == 0 {
        return None;
    }
    let rest = line[end..].strip_prefix('.')?;
    Some((&line[..end], rest.trim()))
}
