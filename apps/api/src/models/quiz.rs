use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const MIN_QUESTIONS: u32 = 3;
pub const MAX_QUESTIONS: u32 = 8;
pub const DEFAULT_QUESTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    #[default]
    General,
    Kanji,
    Vocabulary,
    Grammar,
    Reading,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::General => "general",
            Topic::Kanji => "kanji",
            Topic::Vocabulary => "vocabulary",
            Topic::Grammar => "grammar",
            Topic::Reading => "reading",
        }
    }

    /// Short steering sentence inserted into the generation prompt.
    pub fn hint(&self) -> &'static str {
        match self {
            Topic::General => "Mix kanji reading, grammar, and vocabulary questions.",
            Topic::Kanji => "Focus on kanji reading (kanji on question line, kana options).",
            Topic::Vocabulary => "Focus on vocabulary meaning and usage blanks.",
            Topic::Grammar => "Focus on particles and basic grammar blanks.",
            Topic::Reading => "Start with a short reading passage, then questions about it.",
        }
    }
}

/// JLPT level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    N5,
    N4,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::N5 => "N5",
            Difficulty::N4 => "N4",
        }
    }
}

fn default_num_questions() -> u32 {
    DEFAULT_QUESTIONS
}

/// What the user asked for when generating a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSettings {
    #[serde(default)]
    pub topic: Topic,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            topic: Topic::default(),
            difficulty: Difficulty::default(),
            num_questions: DEFAULT_QUESTIONS,
        }
    }
}

impl QuizSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(AppError::Validation(format!(
                "num_questions must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {}",
                self.num_questions
            )));
        }
        Ok(())
    }
}
