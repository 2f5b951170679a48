//! Responder backed by a remote `teleData` endpoint

use super::types::TeleDataRequest;
use super::{Responder, ResponderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Posts `{"question": ...}` to `{base}/api/teleData` and reads `answer`
/// from the JSON reply
pub struct RemoteResponder {
    client: Client,
    endpoint: String,
}

impl RemoteResponder {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ResponderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResponderError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/teleData", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// The part of a `teleData` reply a chat client needs; anything else the
/// backend reports is ignored
#[derive(Debug, Deserialize)]
struct RemoteReply {
    answer: String,
}

/// Pull the answer out of a `teleData` reply body
fn parse_answer(body: &str) -> Result<String, ResponderError> {
    let reply: RemoteReply = serde_json::from_str(body)
        .map_err(|e| ResponderError::InvalidResponse(format!("{e} - body: {body}")))?;
    if reply.answer.is_empty() {
        return Err(ResponderError::InvalidResponse(
            "reply carried an empty answer".to_string(),
        ));
    }
    Ok(reply.answer)
}

#[async_trait]
impl Responder for RemoteResponder {
    async fn respond(&self, question: &str) -> Result<String, ResponderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TeleDataRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::Unavailable(format!("request timeout: {e}"))
                } else {
                    ResponderError::Unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResponderError::Unavailable(format!("failed to read reply: {e}")))?;

        if !status.is_success() {
            return Err(ResponderError::Unavailable(format!("HTTP {status}: {body}")));
        }

        parse_answer(&body)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_parse_answer() {
        let body = r#"{"question":"q","answer":"Colonel Smith","sql_query":"SELECT 1","result_count":1}"#;
        assert_eq!(parse_answer(body).unwrap(), "Colonel Smith");
    }

    #[test]
    fn test_parse_answer_only_needs_answer() {
        assert_eq!(parse_answer(r#"{"answer":"Colonel Smith"}"#).unwrap(), "Colonel Smith");
    }

    #[test]
    fn test_parse_answer_rejects_missing_or_empty() {
        assert!(matches!(
            parse_answer("{}"),
            Err(ResponderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_answer(r#"{"answer":""}"#),
            Err(ResponderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_answer("not json"),
            Err(ResponderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_endpoint() {
        let responder = RemoteResponder::new("http://example.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(responder.endpoint(), "http://example.test/api/teleData");
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_round_trip_against_server() {
        let router = Router::new().route(
            "/api/teleData",
            post(|Json(body): Json<Value>| async move {
                let question = body["question"].as_str().unwrap_or_default().to_string();
                Json(json!({ "question": question, "answer": format!("echo: {question}") }))
            }),
        );
        let base = serve(router).await;

        let responder = RemoteResponder::new(&base, Duration::from_secs(5)).unwrap();
        let answer = responder.respond("who is on call?").await.unwrap();
        assert_eq!(answer, "echo: who is on call?");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/api/teleData",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;

        let responder = RemoteResponder::new(&base, Duration::from_secs(5)).unwrap();
        let err = responder.respond("anything").await.unwrap_err();
        assert!(matches!(err, ResponderError::Unavailable(_)));
        assert!(err.to_string().contains("500"));
    }
}
