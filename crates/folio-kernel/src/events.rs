//! Session notifications.
//!
//! Broadcast to anyone holding a receiver from
//! [`EditSession::subscribe`](crate::EditSession::subscribe). A lagging
//! receiver loses old events, never the session's state.

use folio_types::DocumentId;

/// Something a UI might want to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A debounced save was handed to the repository.
    SaveStarted,
    /// The repository accepted a save.
    Saved { document_id: DocumentId },
    /// The repository rejected a save. Editing continues; the next change
    /// schedules another attempt.
    SaveFailed { message: String },
}

pub(crate) const EVENT_CAPACITY: usize = 64;
