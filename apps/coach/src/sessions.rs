use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::workflow::WorkflowState;

/// Handle to one session. Hold the lock for the whole step so a session's
/// mutations never interleave.
pub type SessionHandle = Arc<Mutex<WorkflowState>>;

/// In-memory session store. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session at Intake and returns its id.
    pub async fn create(&self) -> Uuid {
        let state = WorkflowState::new();
        let id = state.id();
        self.inner
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(state)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    /// Ends a session. Its workflow state is dropped once no request still holds it.
    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.inner
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::workflow::Step;

    #[tokio::test]
    async fn test_create_then_get() {
        let store = SessionStore::new();
        let id = store.create().await;

        let session = store.get(id).await.unwrap();
        let state = session.lock().await;
        assert_eq!(state.id(), id);
        assert_eq!(state.step(), Step::Intake);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_discards_session() {
        let store = SessionStore::new();
        let keep = store.create().await;
        let gone = store.create().await;

        store.remove(gone).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(matches!(store.get(gone).await, Err(AppError::NotFound(_))));
        assert!(store.get(keep).await.is_ok());
        assert!(matches!(store.remove(gone).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);

        let clone = store.clone();
        assert!(clone.get(a).await.is_ok());
    }
}
