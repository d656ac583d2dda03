pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::quiz::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            delete(handlers::handle_delete_session),
        )
        // Quiz lifecycle
        .route(
            "/api/v1/sessions/:id/quiz",
            post(handlers::handle_generate_quiz)
                .get(handlers::handle_get_quiz)
                .delete(handlers::handle_clear_quiz),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            put(handlers::handle_record_answer).delete(handlers::handle_reset_answers),
        )
        .route("/api/v1/sessions/:id/submit", post(handlers::handle_submit))
        // Progress
        .route(
            "/api/v1/sessions/:id/history",
            get(handlers::handle_get_history).delete(handlers::handle_clear_history),
        )
        .route("/api/v1/sessions/:id/report", post(handlers::handle_report))
        // Stateless parsers
        .route("/api/v1/parse/quiz", post(handlers::handle_parse_quiz))
        .route("/api/v1/parse/feedback", post(handlers::handle_parse_feedback))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::errors::AppError;
    use crate::models::quiz::QuizSettings;
    use crate::quiz::generator::QuizAuthor;
    use crate::session::{ProgressStats, SessionStore};

    const QUIZ_TEXT: &str =
        "1. 来月\n○ らいげつ\n○ らいがつ\n○ くがつ\n○ くげつ\n\n2. ほん____よみます\n○ を\n○ に\n○ が\n";
    const FEEDBACK_TEXT: &str = "Score: 1 / 2 (50%)\n\nQ1: Correct\n- Your answer: A\n- Correct answer: A\n\nQ2: Incorrect\n- Your answer: B\n- Correct answer: A\n";

    /// Canned author: fixed quiz text, fixed grading, or failures on demand.
    struct CannedAuthor {
        quiz: &'static str,
        feedback: Option<&'static str>,
    }

    #[async_trait]
    impl QuizAuthor for CannedAuthor {
        async fn write_quiz(&self, _settings: &QuizSettings) -> Result<String, AppError> {
            Ok(self.quiz.to_string())
        }

        async fn grade(&self, quiz_text: &str, answers_json: &str) -> Result<String, AppError> {
            assert!(quiz_text.starts_with("1."));
            assert!(answers_json.contains("\"1\""));
            self.feedback
                .map(str::to_string)
                .ok_or_else(|| AppError::Llm("grader offline".to_string()))
        }

        async fn write_report(&self, stats: &ProgressStats) -> Result<String, AppError> {
            Ok(format!("# Summary\n{} quizzes", stats.total_quizzes))
        }
    }

    fn app(quiz: &'static str, feedback: Option<&'static str>) -> Router {
        build_router(AppState {
            sessions: SessionStore::new(),
            author: Arc::new(CannedAuthor { quiz, feedback }),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn answer(app: &Router, session: &str, number: &str, index: usize) -> (StatusCode, Value) {
        send(
            app,
            Method::PUT,
            &format!("/api/v1/sessions/{session}/answers"),
            Some(json!({ "question_number": number, "option_index": index })),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(QUIZ_TEXT, Some(FEEDBACK_TEXT));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_full_quiz_flow() {
        let app = app(QUIZ_TEXT, Some(FEEDBACK_TEXT));
        let session = new_session(&app).await;

        let (status, quiz) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{session}/quiz"),
            Some(json!({ "topic": "kanji", "num_questions": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quiz["questions"].as_array().unwrap().len(), 2);
        assert_eq!(quiz["questions"][0]["options"][1]["letter"], "B");
        assert_eq!(quiz["completion"]["status"], "incomplete");

        let (status, body) = answer(&app, &session, "1", 0).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["letter"], "A");

        let (status, body) = send(&app, Method::POST, &format!("/api/v1/sessions/{session}/submit"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INCOMPLETE_SUBMISSION");
        assert_eq!(body["error"]["details"]["expected"], 2);

        answer(&app, &session, "2", 2).await;
        let (status, body) = answer(&app, &session, "2", 1).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answers"], json!({ "1": "A", "2": "B" }));
        assert_eq!(body["completion"]["status"], "complete");

        let (status, body) = send(&app, Method::POST, &format!("/api/v1/sessions/{session}/submit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct_count"], 1);
        assert_eq!(body["no_feedback_parsed"], false);
        assert_eq!(body["feedback"]["score"]["total"], 2);
        assert_eq!(body["feedback"]["records"][1]["verdict"], "incorrect");

        let (status, _) = answer(&app, &session, "1", 1).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, history) = send(&app, Method::GET, &format!("/api/v1/sessions/{session}/history"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["stats"]["graded_quizzes"], 1);
        assert_eq!(history["quizzes"][0]["score"]["achieved"], 1);

        let (status, report) = send(&app, Method::POST, &format!("/api/v1/sessions/{session}/report"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(report["report"].as_str().unwrap().contains("1 quizzes"));
    }

    #[tokio::test]
    async fn test_unparseable_quiz_is_rejected() {
        let app = app("Sorry, I cannot help with that.", None);
        let session = new_session(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{session}/quiz"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["message"].as_str().unwrap().contains("regenerate"));

        let (status, _) = send(&app, Method::GET, &format!("/api/v1/sessions/{session}/quiz"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_question_count_is_rejected() {
        let app = app(QUIZ_TEXT, None);
        let session = new_session(&app).await;
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{session}/quiz"),
            Some(json!({ "num_questions": 20 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grading_failure_unfreezes_answers() {
        let app = app(QUIZ_TEXT, None);
        let session = new_session(&app).await;
        send(&app, Method::POST, &format!("/api/v1/sessions/{session}/quiz"), Some(json!({}))).await;
        answer(&app, &session, "1", 0).await;
        answer(&app, &session, "2", 0).await;

        let (status, body) = send(&app, Method::POST, &format!("/api/v1/sessions/{session}/submit"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_ERROR");

        let (status, _) = answer(&app, &session, "1", 3).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::DELETE, &format!("/api/v1/sessions/{session}/answers"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dropped"], 2);
        assert_eq!(body["completion"]["answered"], 0);
    }

    #[tokio::test]
    async fn test_clear_quiz_and_unknown_session() {
        let app = app(QUIZ_TEXT, None);
        let session = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{session}/quiz");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, Method::POST, &uri, Some(json!({}))).await;
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let missing = uuid::Uuid::new_v4();
        let (status, _) = send(&app, Method::GET, &format!("/api/v1/sessions/{missing}/history"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_report_requires_history() {
        let app = app(QUIZ_TEXT, None);
        let session = new_session(&app).await;
        let (status, _) = send(&app, Method::POST, &format!("/api/v1/sessions/{session}/report"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_stateless_parse_endpoints() {
        let app = app(QUIZ_TEXT, None);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/parse/quiz",
            Some(json!({ "text": "1. 本\n○ ほん\n" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"][0]["usable"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/parse/feedback",
            Some(json!({ "text": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "Score: 0 / 0 (0%)");
        assert_eq!(body["records"], json!([]));
    }
}
