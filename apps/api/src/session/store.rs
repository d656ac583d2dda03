use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::Session;

/// In-memory session registry. Each session is only ever touched under the lock.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.inner.write().await.insert(id, session);
        debug!(session_id = %id, "Session created");
        id
    }

    pub async fn read<T>(&self, id: Uuid, f: impl FnOnce(&Session) -> T) -> Result<T, AppError> {
        let sessions = self.inner.read().await;
        sessions.get(&id).map(f).ok_or_else(|| not_found(id))
    }

    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        f(session)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| debug!(session_id = %id, "Session removed"))
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuizSettings;
    use crate::quiz::parser::parse_quiz;

    #[tokio::test]
    async fn test_create_read_remove() {
        let store = SessionStore::new();
        let id = store.create().await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.read(id, |s| s.id).await.unwrap(), id);

        store.remove(id).await.unwrap();
        assert!(matches!(
            store.read(id, |s| s.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.remove(id).await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_answers() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        let quiz = "1. 本\n○ ほん\n○ もと\n";

        for id in [a, b] {
            store
                .update(id, |s| {
                    s.start_quiz(QuizSettings::default(), quiz.to_string(), parse_quiz(quiz));
                    Ok(())
                })
                .await
                .unwrap();
        }
        store.update(a, |s| s.record_answer("1", 1)).await.unwrap();

        let answered_in_b = store
            .read(b, |s| s.current.as_ref().map(|q| q.answers.len()))
            .await
            .unwrap();
        assert_eq!(answered_in_b, Some(0));
    }
}
