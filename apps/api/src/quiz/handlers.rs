//! Axum route handlers for sessions, quizzes, answers, and grading.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::quiz::QuizSettings;
use crate::quiz::answers::{AnswerLetter, AnswerSheet, Completion};
use crate::quiz::feedback::{parse_feedback, FeedbackReport, Verdict};
use crate::quiz::parser::{parse_quiz, Question};
use crate::session::{ActiveQuiz, ProgressStats, QuizRecord};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub letter: char,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub number: String,
    pub prompt_text: String,
    pub options: Vec<OptionView>,
    /// False when the question has fewer than two options; the UI shows a warning instead.
    pub usable: bool,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            number: q.number.clone(),
            prompt_text: q.prompt_text.clone(),
            options: q
                .labelled_options()
                .map(|(letter, text)| OptionView {
                    letter,
                    text: text.to_string(),
                })
                .collect(),
            usable: q.is_usable(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizView {
    pub quiz_id: Uuid,
    pub settings: QuizSettings,
    pub questions: Vec<QuestionView>,
    pub answers: AnswerSheet,
    pub completion: Completion,
    pub submitted: bool,
    pub feedback: Option<FeedbackReport>,
    pub created_at: DateTime<Utc>,
}

impl From<&ActiveQuiz> for QuizView {
    fn from(quiz: &ActiveQuiz) -> Self {
        Self {
            quiz_id: quiz.id,
            settings: quiz.settings.clone(),
            questions: quiz.questions.iter().map(QuestionView::from).collect(),
            answers: quiz.answers.clone(),
            completion: quiz.completion(),
            submitted: quiz.submitted,
            feedback: quiz.feedback.clone(),
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_number: String,
    pub option_index: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordAnswerResponse {
    pub letter: AnswerLetter,
    pub answers: AnswerSheet,
    pub completion: Completion,
}

#[derive(Debug, Serialize)]
pub struct ResetAnswersResponse {
    pub dropped: usize,
    pub completion: Completion,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub feedback: FeedbackReport,
    pub correct_count: usize,
    /// Distinguishes "the grader's text had no verdicts" from "the user scored zero".
    pub no_feedback_parsed: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub stats: ProgressStats,
    pub quizzes: Vec<QuizRecord>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub stats: ProgressStats,
    pub report: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseQuizResponse {
    pub questions: Vec<QuestionView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/quiz
///
/// Asks the LLM for a quiz, parses it, and makes it the session's current quiz.
/// Text that yields no questions is rejected so the user can regenerate.
pub async fn handle_generate_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(settings): Json<QuizSettings>,
) -> Result<Json<QuizView>, AppError> {
    settings.validate()?;
    state.sessions.read(id, |_| ()).await?;

    let raw_text = state.author.write_quiz(&settings).await?;
    let questions = parse_quiz(&raw_text);
    if questions.is_empty() {
        warn!(session_id = %id, "LLM quiz text produced no questions");
        return Err(AppError::UnprocessableEntity(
            "Could not parse quiz questions. Please regenerate.".to_string(),
        ));
    }
    if questions.len() != settings.num_questions as usize {
        warn!(
            requested = settings.num_questions,
            parsed = questions.len(),
            "Parsed question count differs from the requested count"
        );
    }
    info!(session_id = %id, questions = questions.len(), "Quiz generated");

    let view = state
        .sessions
        .update(id, |session| {
            Ok(QuizView::from(session.start_quiz(settings, raw_text, questions)))
        })
        .await?;
    Ok(Json(view))
}

/// GET /api/v1/sessions/:id/quiz
pub async fn handle_get_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, AppError> {
    let view = state
        .sessions
        .read(id, |session| session.current().map(QuizView::from))
        .await??;
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:id/quiz
pub async fn handle_clear_quiz(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let cleared = state
        .sessions
        .update(id, |session| Ok(session.clear()))
        .await?;
    if !cleared {
        return Err(AppError::NotFound("No active quiz in this session".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/:id/answers
pub async fn handle_record_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordAnswerRequest>,
) -> Result<Json<RecordAnswerResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let letter = session.record_answer(&request.question_number, request.option_index)?;
            let quiz = session.current()?;
            let completion = quiz.completion();
            if completion.is_complete() {
                debug!(session_id = %id, "All usable questions answered");
            }
            Ok(RecordAnswerResponse {
                letter,
                answers: quiz.answers.clone(),
                completion,
            })
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/:id/answers
pub async fn handle_reset_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResetAnswersResponse>, AppError> {
    let response = state
        .sessions
        .update(id, |session| {
            let dropped = session.reset_answers()?;
            let quiz = session.current()?;
            Ok(ResetAnswersResponse {
                dropped,
                completion: quiz.completion(),
            })
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/submit
///
/// Completion check → LLM grading → feedback parse. A failed grading call
/// unfreezes the answers so the user can resubmit.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmitResponse>, AppError> {
    let request = state.sessions.update(id, |session| session.submit()).await?;

    let feedback_text = match state
        .author
        .grade(&request.quiz_text, &request.answers_json)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            // The session may be gone by now; the grading error is what gets returned.
            if let Err(unfreeze) = state
                .sessions
                .update(id, |session| {
                    session.abort_submission(request.quiz_id);
                    Ok(())
                })
                .await
            {
                warn!(
                    session_id = %id,
                    error = %unfreeze,
                    "Could not unfreeze answers after grading failure"
                );
            }
            return Err(e);
        }
    };

    let questions = parse_quiz(&request.quiz_text);
    let feedback = parse_feedback(&feedback_text);
    feedback.warn_on_mismatch(&questions);
    if feedback.records.is_empty() {
        warn!(session_id = %id, "Grading text produced no feedback records");
    }
    for record in feedback.records.iter().filter(|r| r.verdict == Verdict::Incorrect) {
        debug!(
            question = %record.question_number,
            answered = record.detail("Your answer").unwrap_or("?"),
            expected = record.detail("Correct answer").unwrap_or("?"),
            "Incorrect answer"
        );
    }

    let response = SubmitResponse {
        correct_count: feedback.correct_count(),
        no_feedback_parsed: feedback.records.is_empty(),
        feedback: feedback.clone(),
    };
    state
        .sessions
        .update(id, |session| {
            session.attach_feedback(request.quiz_id, feedback);
            Ok(())
        })
        .await?;

    Ok(Json(response))
}

/// GET /api/v1/sessions/:id/history
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let response = state
        .sessions
        .read(id, |session| HistoryResponse {
            stats: session.stats(),
            quizzes: session.history.clone(),
        })
        .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/sessions/:id/history
pub async fn handle_clear_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .update(id, |session| {
            session.clear_history();
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/report
pub async fn handle_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    let stats = state.sessions.read(id, |session| session.stats()).await?;
    if stats.total_quizzes == 0 {
        return Err(AppError::UnprocessableEntity(
            "No quiz history yet. Take a quiz first.".to_string(),
        ));
    }
    let report = state.author.write_report(&stats).await?;
    Ok(Json(ReportResponse { stats, report }))
}

/// POST /api/v1/parse/quiz
pub async fn handle_parse_quiz(Json(request): Json<ParseTextRequest>) -> Json<ParseQuizResponse> {
    let questions = parse_quiz(&request.text)
        .iter()
        .map(QuestionView::from)
        .collect();
    Json(ParseQuizResponse { questions })
}

/// POST /api/v1/parse/feedback
pub async fn handle_parse_feedback(Json(request): Json<ParseTextRequest>) -> Json<FeedbackReport> {
    Json(parse_feedback(&request.text))
}
