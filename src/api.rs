//! HTTP API
//!
//! A stateless `teleData` endpoint plus session-backed chat with an SSE feed.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::chat::SessionManager;
use crate::responder::Responder;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(responder: Arc<dyn Responder>, response_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(responder, response_timeout)),
        }
    }
}
