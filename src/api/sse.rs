//! Server-Sent Events support

use super::types::MessageView;
use crate::chat::{Message, SessionEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert a session's broadcast channel to an SSE stream, starting with an
/// `init` snapshot of the transcript
pub fn sse_stream(
    session_id: String,
    messages: &[Message],
    pending: bool,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let views: Vec<MessageView> = messages.iter().map(MessageView::from).collect();
    let init_data = json!({
        "type": "init",
        "session_id": session_id,
        "messages": views,
        "pending": pending
    });
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init_data.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_axum(&event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_axum(event: &SessionEvent) -> Event {
    let (event_type, data) = match event {
        SessionEvent::MessageAppended { message } => (
            "message",
            json!({
                "type": "message",
                "message": MessageView::from(message)
            }),
        ),
        SessionEvent::PendingChanged { pending } => (
            "pending",
            json!({
                "type": "pending",
                "pending": pending
            }),
        ),
        SessionEvent::Cleared => (
            "cleared",
            json!({
                "type": "cleared"
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
