//! Quiz author — the boundary to the LLM for writing and grading quizzes.
//!
//! `AppState` holds an `Arc<dyn QuizAuthor>`; `LlmQuizAuthor` is the production
//! backend, tests swap in a canned one.

use async_trait::async_trait;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{plain_text_system, TEACHER_PERSONA};
use crate::llm_client::LlmClient;
use crate::models::quiz::QuizSettings;
use crate::quiz::prompts::{
    build_grading_prompt, build_quiz_prompt, build_report_prompt, GRADING_ROLE, QUIZ_ROLE,
    REPORT_ROLE,
};
use crate::session::ProgressStats;

#[async_trait]
pub trait QuizAuthor: Send + Sync {
    /// Raw quiz text in the numbered / `○` option convention.
    async fn write_quiz(&self, settings: &QuizSettings) -> Result<String, AppError>;

    /// Raw feedback text: score line, then `Qn: verdict` blocks.
    async fn grade(&self, quiz_text: &str, answers_json: &str) -> Result<String, AppError>;

    /// Markdown progress report.
    async fn write_report(&self, stats: &ProgressStats) -> Result<String, AppError>;
}

pub struct LlmQuizAuthor(pub LlmClient);

#[async_trait]
impl QuizAuthor for LlmQuizAuthor {
    async fn write_quiz(&self, settings: &QuizSettings) -> Result<String, AppError> {
        info!(
            topic = settings.topic.as_str(),
            difficulty = settings.difficulty.as_str(),
            num_questions = settings.num_questions,
            "Generating quiz"
        );
        let prompt = build_quiz_prompt(settings);
        self.0
            .call_text(&prompt, &plain_text_system(QUIZ_ROLE))
            .await
            .map_err(|e| AppError::Llm(format!("quiz generation failed: {e}")))
    }

    async fn grade(&self, quiz_text: &str, answers_json: &str) -> Result<String, AppError> {
        info!("Grading submitted answers");
        let prompt = build_grading_prompt(quiz_text, answers_json);
        self.0
            .call_text(&prompt, &plain_text_system(GRADING_ROLE))
            .await
            .map_err(|e| AppError::Llm(format!("answer analysis failed: {e}")))
    }

    async fn write_report(&self, stats: &ProgressStats) -> Result<String, AppError> {
        info!(total_quizzes = stats.total_quizzes, "Generating progress report");
        let prompt = build_report_prompt(stats);
        // Reports are rendered as markdown, so the plain-text rule does not apply.
        let system = format!("{TEACHER_PERSONA} {REPORT_ROLE}");
        self.0
            .call_text(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("report generation failed: {e}")))
    }
}
