//! Registry of live chat sessions

use super::session::ChatSession;
use crate::responder::Responder;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Creates and tracks sessions that share one responder
pub struct SessionManager {
    responder: Arc<dyn Responder>,
    response_timeout: Duration,
    sessions: RwLock<HashMap<String, Arc<ChatSession>>>,
}

impl SessionManager {
    pub fn new(responder: Arc<dyn Responder>, response_timeout: Duration) -> Self {
        Self {
            responder,
            response_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new chat
    pub async fn create(&self) -> Arc<ChatSession> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(
            ChatSession::new(id.clone(), Arc::clone(&self.responder))
                .with_response_timeout(self.response_timeout),
        );
        let live = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.clone(), Arc::clone(&session));
            sessions.len()
        };
        tracing::info!(session_id = %id, live, "Session created");
        session
    }

    pub async fn get(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session, cancelling its in-flight response
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.reset();
                tracing::info!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    /// Upper bound on a single responder call
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}
