//! Contacts question answering
//!
//! Answers questions about the `Contacts` table by having a local model
//! write SQL for them. The pipeline is: extract rank/name, prompt for SQL,
//! clean and guard the query, run it, then summarize the rows in prose.

mod entities;
mod prompt;
mod sql_guard;
mod store;
mod summary;

pub use store::{ContactStore, StoreError};

use entities::Entities;
use sql_guard::SqlGuardError;

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::responder::{Responder, ResponderError, TeleDataAnswer, APOLOGY_PREFIX};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Where the pipeline gave up
#[derive(Debug, Error)]
enum PipelineError {
    #[error(transparent)]
    Guard(#[from] SqlGuardError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Responder backed by an LLM and the contacts database
pub struct ContactsResponder {
    llm: Arc<dyn LlmService>,
    store: ContactStore,
}

impl ContactsResponder {
    pub fn new(llm: Arc<dyn LlmService>, store: ContactStore) -> Self {
        Self { llm, store }
    }

    /// Ask the model for rank and name, falling back to pattern matching
    /// when it fails or replies with something unparseable
    async fn extract_entities(&self, question: &str) -> Entities {
        let request = LlmRequest::user(entities::extraction_prompt(question));
        match self.llm.complete(&request).await {
            Ok(response) => entities::parse_model_entities(&response.text).unwrap_or_else(|| {
                tracing::debug!(reply = %response.text, "Unparseable entity reply, using patterns");
                entities::extract_with_patterns(question)
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Entity extraction failed, using patterns");
                entities::extract_with_patterns(question)
            }
        }
    }

    async fn generate_sql(&self, question: &str) -> Result<String, PipelineError> {
        let entities = self.extract_entities(question).await;
        tracing::debug!(rank = ?entities.rank, name = ?entities.name, "Extracted entities");

        let request = LlmRequest::user(prompt::sql_prompt(question, &entities));
        let response = self.llm.complete(&request).await?;

        let sql = sql_guard::clean_sql_query(&response.text);
        let sql = sql_guard::ensure_entities_in_query(
            &sql,
            entities.rank.as_deref(),
            entities.name.as_deref(),
        );
        Ok(sql_guard::validate_and_sanitize_sql(&sql)?)
    }

    async fn run(&self, question: &str) -> Result<TeleDataAnswer, PipelineError> {
        let sql = self.generate_sql(question).await?;
        tracing::info!(sql = %sql, "Generated SQL query");

        let rows = self.store.run_select(&sql)?;
        Ok(TeleDataAnswer {
            question: question.to_string(),
            answer: summary::summarize(question, &rows),
            sql_query: Some(sql),
            result_count: Some(rows.len()),
            raw_results: rows,
            error: None,
        })
    }
}

#[async_trait]
impl Responder for ContactsResponder {
    async fn respond(&self, question: &str) -> Result<String, ResponderError> {
        self.answer(question).await.map(|a| a.answer)
    }

    async fn answer(&self, question: &str) -> Result<TeleDataAnswer, ResponderError> {
        match self.run(question).await {
            Ok(answer) => Ok(answer),
            Err(PipelineError::Guard(e)) => Ok(TeleDataAnswer {
                error: Some(e.to_string()),
                ..TeleDataAnswer::plain(
                    question,
                    format!("I'm sorry, I couldn't create a safe query for your question: {e}"),
                )
            }),
            Err(PipelineError::Store(e)) => Ok(TeleDataAnswer {
                error: Some(e.to_string()),
                ..TeleDataAnswer::plain(question, format!("{APOLOGY_PREFIX}: {e}"))
            }),
            // The model being down is a backend outage, not an answer
            Err(PipelineError::Llm(e)) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "contacts"
    }
}
