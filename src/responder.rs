//! Responder boundary
//!
//! Maps a user question to an answer string. The chat session only sees this
//! trait; the canned table, a remote `teleData` backend and the local
//! contacts pipeline all sit behind it.

mod error;
mod remote;
pub mod rule_based;
mod types;

pub use error::ResponderError;
pub use remote::RemoteResponder;
pub use rule_based::{DelayRange, RuleBasedResponder};
pub use types::TeleDataAnswer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Start of every apology shown in place of an answer that could not be produced
pub const APOLOGY_PREFIX: &str =
    "I'm sorry, I encountered an error while trying to answer your question";

/// Produces an answer for a question, possibly after a delay
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, question: &str) -> Result<String, ResponderError>;

    /// Answer with whatever detail the backend can report about how it got
    /// there. Backends without such detail just wrap [`Responder::respond`].
    async fn answer(&self, question: &str) -> Result<TeleDataAnswer, ResponderError> {
        let answer = self.respond(question).await?;
        Ok(TeleDataAnswer::plain(question, answer))
    }

    /// Short name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, question: &str) -> Result<String, ResponderError> {
        (**self).respond(question).await
    }

    async fn answer(&self, question: &str) -> Result<TeleDataAnswer, ResponderError> {
        (**self).answer(question).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Logging wrapper for responders
pub struct LoggingResponder {
    inner: Arc<dyn Responder>,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn Responder>) -> Self {
        Self { inner }
    }

    fn log_outcome(
        &self,
        question: &str,
        duration: Duration,
        outcome: Result<usize, &ResponderError>,
    ) {
        match outcome {
            Ok(answer_len) => {
                tracing::info!(
                    responder = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    question_len = question.len(),
                    answer_len,
                    "Responder answered"
                );
            }
            Err(e) => {
                tracing::warn!(
                    responder = %self.inner.name(),
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "Responder failed"
                );
            }
        }
    }
}

#[async_trait]
impl Responder for LoggingResponder {
    async fn respond(&self, question: &str) -> Result<String, ResponderError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(question).await;
        self.log_outcome(question, start.elapsed(), result.as_ref().map(String::len));
        result
    }

    async fn answer(&self, question: &str) -> Result<TeleDataAnswer, ResponderError> {
        let start = std::time::Instant::now();
        let result = self.inner.answer(question).await;
        self.log_outcome(question, start.elapsed(), result.as_ref().map(|a| a.answer.len()));
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
