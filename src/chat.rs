//! Conversation sessions
//!
//! A session owns an append-only transcript and at most one in-flight
//! responder call. Every mutation is announced as a [`SessionEvent`] so a
//! view can re-render from session state alone.

mod event;
mod manager;
mod message;
mod session;

pub use event::SessionEvent;
pub use manager::SessionManager;
pub use message::{Message, Sender};
pub use session::{ChatSession, SessionError, Submission};
