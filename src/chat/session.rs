//! Chat session: transcript plus the single outstanding responder call

use super::event::SessionEvent;
use super::message::{Message, Sender, Transcript};
use crate::responder::{Responder, ResponderError, APOLOGY_PREFIX};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60);
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A response is still pending; wait for it before sending another message")]
    ResponsePending,
}

/// Result of [`ChatSession::submit`]
#[derive(Debug)]
#[must_use]
pub enum Submission {
    /// Blank input; nothing happened
    Ignored,
    /// User message appended and a response requested
    Accepted(PendingResponse),
}

/// Handle to the background response for one submission
#[derive(Debug)]
pub struct PendingResponse {
    handle: JoinHandle<()>,
}

impl PendingResponse {
    /// Wait until the bot message is appended, or the response is discarded
    /// by a reset
    pub async fn finished(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Response task failed");
        }
    }
}

#[derive(Default)]
struct SessionState {
    transcript: Transcript,
    /// Present while a response is in flight; cancelled by `reset`
    pending: Option<CancellationToken>,
}

pub struct ChatSession {
    id: String,
    responder: Arc<dyn Responder>,
    response_timeout: Duration,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, responder: Arc<dyn Responder>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            id: id.into(),
            responder,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            state: Arc::new(Mutex::new(SessionState::default())),
            events,
        }
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    #[allow(dead_code)] // Used in tests
    pub fn transcript(&self) -> Vec<Message> {
        self.state.lock().unwrap().transcript.messages().to_vec()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_pending(&self) -> bool {
        self.state.lock().unwrap().pending.is_some()
    }

    /// Transcript and pending flag read under one lock
    pub fn snapshot(&self) -> (Vec<Message>, bool) {
        let state = self.state.lock().unwrap();
        (state.transcript.messages().to_vec(), state.pending.is_some())
    }

    /// Append a user message and request a response in the background.
    ///
    /// Blank input is ignored. A second submission while a response is still
    /// pending is rejected rather than queued. Must be called from within a
    /// tokio runtime.
    pub fn submit(&self, text: &str) -> Result<Submission, SessionError> {
        if text.trim().is_empty() {
            return Ok(Submission::Ignored);
        }

        let cancel = CancellationToken::new();
        {
            let mut state = self.state.lock().unwrap();
            if state.pending.is_some() {
                return Err(SessionError::ResponsePending);
            }
            let message = state.transcript.append(Sender::User, text).clone();
            state.pending = Some(cancel.clone());
            // Sent under the lock so subscribers see events in transcript order
            let _ = self.events.send(SessionEvent::MessageAppended { message });
            let _ = self.events.send(SessionEvent::PendingChanged { pending: true });
        }

        tracing::debug!(session_id = %self.id, responder = %self.responder.name(), "Requesting response");

        let task = ResponseTask {
            session_id: self.id.clone(),
            question: text.to_string(),
            responder: Arc::clone(&self.responder),
            timeout: self.response_timeout,
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            cancel,
        };
        let handle = tokio::spawn(task.run());

        Ok(Submission::Accepted(PendingResponse { handle }))
    }

    /// Clear the transcript and drop any in-flight response. A response that
    /// arrives after the reset is discarded. Idempotent.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        let was_pending = match state.pending.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        };
        state.transcript.clear();
        let _ = self.events.send(SessionEvent::Cleared);
        if was_pending {
            let _ = self.events.send(SessionEvent::PendingChanged { pending: false });
        }
        tracing::debug!(session_id = %self.id, was_pending, "Session reset");
    }
}

/// Everything the background response needs, detached from the session
struct ResponseTask {
    session_id: String,
    question: String,
    responder: Arc<dyn Responder>,
    timeout: Duration,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
}

impl ResponseTask {
    async fn run(self) {
        // A panicking responder must still clear pending
        let call = AssertUnwindSafe(self.responder.respond(&self.question)).catch_unwind();
        let outcome = tokio::select! {
            () = self.cancel.cancelled() => {
                tracing::debug!(session_id = %self.session_id, "Response cancelled by reset");
                return;
            }
            result = tokio::time::timeout(self.timeout, call) => result,
        };

        let text = match outcome {
            Ok(Ok(Ok(answer))) => answer,
            Ok(Ok(Err(e))) => self.apologize(&e),
            Ok(Err(_)) => self.apologize(&ResponderError::Unavailable(
                "responder panicked".to_string(),
            )),
            Err(_) => self.apologize(&ResponderError::Timeout(self.timeout)),
        };

        let mut state = self.state.lock().unwrap();
        // reset() cancels under the same lock, so this check cannot race it
        if self.cancel.is_cancelled() {
            tracing::debug!(session_id = %self.session_id, "Discarding stale response after reset");
            return;
        }
        let message = state.transcript.append(Sender::Bot, text).clone();
        state.pending = None;
        let _ = self.events.send(SessionEvent::MessageAppended { message });
        let _ = self.events.send(SessionEvent::PendingChanged { pending: false });
    }

    fn apologize(&self, error: &ResponderError) -> String {
        tracing::warn!(session_id = %self.session_id, error = %error, "Responder failed; sending apology");
        format!("{APOLOGY_PREFIX}: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::rule_based::{FALLBACK_ANSWER, PYTHON_ANSWER};
    use crate::responder::RuleBasedResponder;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Responder that waits for a release before answering
    struct GatedResponder {
        gate: Arc<Notify>,
        answer: Result<String, String>,
    }

    impl GatedResponder {
        fn new(answer: Result<&str, &str>) -> (Arc<Self>, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let responder = Arc::new(Self {
                gate: Arc::clone(&gate),
                answer: answer.map(String::from).map_err(String::from),
            });
            (responder, gate)
        }
    }

    #[async_trait]
    impl Responder for GatedResponder {
        async fn respond(&self, _question: &str) -> Result<String, ResponderError> {
            self.gate.notified().await;
            self.answer.clone().map_err(ResponderError::Unavailable)
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    struct PanickingResponder;

    #[async_trait]
    impl Responder for PanickingResponder {
        async fn respond(&self, _question: &str) -> Result<String, ResponderError> {
            panic!("backend bug")
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn instant_session() -> ChatSession {
        ChatSession::new("test", Arc::new(RuleBasedResponder::instant()))
    }

    fn accepted(submission: Submission) -> PendingResponse {
        match submission {
            Submission::Accepted(pending) => pending,
            Submission::Ignored => panic!("expected submission to be accepted"),
        }
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        let session = instant_session();
        assert!(matches!(session.submit("").unwrap(), Submission::Ignored));
        assert!(matches!(session.submit("  \n\t").unwrap(), Submission::Ignored));
        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_bot() {
        let session = instant_session();
        let pending = accepted(session.submit("hello").unwrap());

        // The user message is there before the response resolves
        let (messages, is_pending) = session.snapshot();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].raw_text, "hello");
        assert!(is_pending);

        pending.finished().await;

        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Bot);
        assert_eq!(messages[1].raw_text, FALLBACK_ANSWER);
        assert!(messages[0].id < messages[1].id);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_raw_text_kept_verbatim() {
        let session = instant_session();
        accepted(session.submit("  Python?  ").unwrap()).finished().await;
        let messages = session.transcript();
        assert_eq!(messages[0].raw_text, "  Python?  ");
        assert_eq!(messages[1].raw_text, PYTHON_ANSWER);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_rejected() {
        let (responder, gate) = GatedResponder::new(Ok("done"));
        let session = ChatSession::new("test", responder);

        let pending = accepted(session.submit("first").unwrap());
        assert_eq!(
            session.submit("second").unwrap_err(),
            SessionError::ResponsePending
        );
        assert_eq!(session.transcript().len(), 1);

        gate.notify_one();
        pending.finished().await;

        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].raw_text, "done");

        // Accepted again once the first response landed
        let pending = accepted(session.submit("third").unwrap());
        gate.notify_one();
        pending.finished().await;
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_blank_submit_while_pending_is_still_ignored() {
        let (responder, gate) = GatedResponder::new(Ok("done"));
        let session = ChatSession::new("test", responder);
        let pending = accepted(session.submit("first").unwrap());
        assert!(matches!(session.submit(" ").unwrap(), Submission::Ignored));
        gate.notify_one();
        pending.finished().await;
    }

    #[tokio::test]
    async fn test_responder_failure_becomes_apology() {
        let (responder, gate) = GatedResponder::new(Err("connection refused"));
        let session = ChatSession::new("test", responder);

        let pending = accepted(session.submit("hi").unwrap());
        gate.notify_one();
        pending.finished().await;

        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Bot);
        assert!(messages[1].raw_text.starts_with(APOLOGY_PREFIX));
        assert!(messages[1].raw_text.contains("connection refused"));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_responder_panic_clears_pending() {
        let session = ChatSession::new("test", Arc::new(PanickingResponder));

        accepted(session.submit("hi").unwrap()).finished().await;

        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].raw_text.starts_with(APOLOGY_PREFIX));
        assert!(messages[1].raw_text.contains("panicked"));
        assert!(!session.is_pending());

        // The session keeps accepting messages
        assert!(matches!(session.submit("again"), Ok(Submission::Accepted(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_apology() {
        let (responder, _gate) = GatedResponder::new(Ok("never"));
        let session =
            ChatSession::new("test", responder).with_response_timeout(Duration::from_secs(5));

        accepted(session.submit("hi").unwrap()).finished().await;

        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].raw_text.starts_with(APOLOGY_PREFIX));
        assert!(messages[1].raw_text.contains("timed out"));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_reset_discards_stale_response() {
        let (responder, gate) = GatedResponder::new(Ok("stale"));
        let session = ChatSession::new("test", responder);

        let pending = accepted(session.submit("hi").unwrap());
        session.reset();
        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());

        gate.notify_one();
        pending.finished().await;
        assert!(session.transcript().is_empty());

        // Session is usable again and ids keep increasing
        let pending = accepted(session.submit("again").unwrap());
        gate.notify_one();
        pending.finished().await;
        let messages = session.transcript();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[1].raw_text, "stale");
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let session = instant_session();
        accepted(session.submit("hi").unwrap()).finished().await;
        session.reset();
        session.reset();
        assert!(session.transcript().is_empty());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_events_follow_transcript() {
        let session = instant_session();
        let mut rx = session.subscribe();

        accepted(session.submit("quantum?").unwrap()).finished().await;
        session.reset();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], SessionEvent::MessageAppended { message } if message.sender == Sender::User));
        assert_eq!(events[1], SessionEvent::PendingChanged { pending: true });
        assert!(matches!(&events[2], SessionEvent::MessageAppended { message } if message.sender == Sender::Bot));
        assert_eq!(events[3], SessionEvent::PendingChanged { pending: false });
        assert_eq!(events[4], SessionEvent::Cleared);
    }
}
