//! Notifications emitted by a session

use super::message::Message;

/// A change to session state. Views re-render on each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MessageAppended { message: Message },
    /// The compose control should be disabled while `pending` is true
    PendingChanged { pending: bool },
    Cleared,
}
