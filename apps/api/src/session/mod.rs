//! Quiz sessions — the explicit owner of one user's current quiz, answers, and history.
//!
//! A session never shares its `AnswerSheet` with another quiz: starting a quiz or
//! clearing the current one always begins from a fresh sheet.

pub mod store;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::quiz::QuizSettings;
use crate::quiz::answers::{AnswerLetter, AnswerSheet, Completion};
use crate::quiz::feedback::{FeedbackReport, Score};
use crate::quiz::parser::Question;

pub use store::SessionStore;

#[derive(Debug, Clone, Serialize)]
pub struct ActiveQuiz {
    pub id: Uuid,
    pub settings: QuizSettings,
    pub raw_text: String,
    pub questions: Vec<Question>,
    pub answers: AnswerSheet,
    pub submitted: bool,
    pub feedback: Option<FeedbackReport>,
    pub created_at: DateTime<Utc>,
}

impl ActiveQuiz {
    /// Only usable questions can be answered, so only they count toward completion.
    /// Duplicate numbers share one answer slot and count once.
    pub fn expected_answers(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.is_usable())
            .map(|q| q.number.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn completion(&self) -> Completion {
        self.answers.check_completion(self.expected_answers())
    }
}

/// One entry of the in-memory quiz history.
#[derive(Debug, Clone, Serialize)]
pub struct QuizRecord {
    pub quiz_id: Uuid,
    pub settings: QuizSettings,
    pub question_count: usize,
    pub raw_text: String,
    pub score: Option<Score>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressStats {
    pub total_quizzes: usize,
    pub graded_quizzes: usize,
    pub average_percent: Option<f32>,
    pub topics: Vec<String>,
}

/// What the grader needs once a submission has been accepted.
#[derive(Debug, Clone)]
pub struct GradingRequest {
    pub quiz_id: Uuid,
    pub quiz_text: String,
    pub answers_json: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub current: Option<ActiveQuiz>,
    pub history: Vec<QuizRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            current: None,
            history: Vec::new(),
        }
    }

    /// Replaces the current quiz with a freshly parsed one and logs it in history.
    pub fn start_quiz(
        &mut self,
        settings: QuizSettings,
        raw_text: String,
        questions: Vec<Question>,
    ) -> &ActiveQuiz {
        let quiz = ActiveQuiz {
            id: Uuid::new_v4(),
            settings,
            raw_text,
            questions,
            answers: AnswerSheet::new(),
            submitted: false,
            feedback: None,
            created_at: Utc::now(),
        };
        self.history.push(QuizRecord {
            quiz_id: quiz.id,
            settings: quiz.settings.clone(),
            question_count: quiz.questions.len(),
            raw_text: quiz.raw_text.clone(),
            score: None,
            created_at: quiz.created_at,
        });
        self.current.insert(quiz)
    }

    pub fn current(&self) -> Result<&ActiveQuiz, AppError> {
        self.current
            .as_ref()
            .ok_or_else(|| AppError::NotFound("No active quiz in this session".to_string()))
    }

    fn current_mut(&mut self) -> Result<&mut ActiveQuiz, AppError> {
        self.current
            .as_mut()
            .ok_or_else(|| AppError::NotFound("No active quiz in this session".to_string()))
    }

    pub fn record_answer(
        &mut self,
        question_number: &str,
        option_index: usize,
    ) -> Result<AnswerLetter, AppError> {
        let quiz = self.current_mut()?;
        if quiz.submitted {
            return Err(AppError::Conflict(
                "Answers are frozen once the quiz is submitted".to_string(),
            ));
        }

        let mut numbered = quiz
            .questions
            .iter()
            .filter(|q| q.number == question_number)
            .peekable();
        if numbered.peek().is_none() {
            return Err(AppError::Validation(format!(
                "Question {question_number} is not in this quiz"
            )));
        }
        let question = numbered.find(|q| q.is_usable()).ok_or_else(|| {
            AppError::Validation(format!("Question {question_number} has insufficient options"))
        })?;
        if option_index >= question.options.len() {
            return Err(AppError::Validation(format!(
                "Question {question_number} has only {} options",
                question.options.len()
            )));
        }

        Ok(quiz.answers.record_answer(question_number, option_index)?)
    }

    /// Clears every answer of the current quiz. Returns how many were dropped.
    pub fn reset_answers(&mut self) -> Result<usize, AppError> {
        let quiz = self.current_mut()?;
        if quiz.submitted {
            return Err(AppError::Conflict(
                "Answers are frozen once the quiz is submitted".to_string(),
            ));
        }
        if quiz.answers.is_empty() {
            return Ok(0);
        }
        let dropped = quiz.answers.len();
        quiz.answers.reset();
        Ok(dropped)
    }

    /// Accepts the answers for grading and freezes them.
    pub fn submit(&mut self) -> Result<GradingRequest, AppError> {
        let quiz = self.current_mut()?;
        if quiz.submitted {
            return Err(AppError::Conflict("Quiz has already been submitted".to_string()));
        }
        if let Completion::Incomplete { answered, expected } = quiz.completion() {
            return Err(AppError::IncompleteSubmission { answered, expected });
        }

        let answers_json = serde_json::to_string_pretty(&quiz.answers.grading_payload(&quiz.questions))
            .map_err(|e| AppError::Internal(e.into()))?;
        quiz.submitted = true;

        Ok(GradingRequest {
            quiz_id: quiz.id,
            quiz_text: quiz.raw_text.clone(),
            answers_json,
        })
    }

    /// Unfreezes a submission whose grading failed, so the user can retry.
    pub fn abort_submission(&mut self, quiz_id: Uuid) {
        if let Some(quiz) = self.current.as_mut().filter(|q| q.id == quiz_id) {
            quiz.submitted = false;
        }
    }

    /// Stores graded feedback. The quiz may have been replaced while grading ran;
    /// the history entry is updated regardless.
    pub fn attach_feedback(&mut self, quiz_id: Uuid, report: FeedbackReport) {
        if let Some(record) = self.history.iter_mut().find(|r| r.quiz_id == quiz_id) {
            record.score = report.score;
        }
        if let Some(quiz) = self.current.as_mut().filter(|q| q.id == quiz_id) {
            quiz.feedback = Some(report);
        }
    }

    /// Abandons the current quiz. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.current = None;
    }

    pub fn stats(&self) -> ProgressStats {
        let graded: Vec<&Score> = self.history.iter().filter_map(|r| r.score.as_ref()).collect();
        let average_percent = (!graded.is_empty())
            .then(|| graded.iter().map(|s| s.percent).sum::<f32>() / graded.len() as f32);

        let mut topics: Vec<String> = Vec::new();
        for record in &self.history {
            let topic = record.settings.topic.as_str();
            if !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
        }

        ProgressStats {
            total_quizzes: self.history.len(),
            graded_quizzes: graded.len(),
            average_percent,
            topics,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
