//! Block list editing for Folio.
//!
//! Everything here is synchronous and infallible. A gesture becomes an
//! [`Intent`], [`BlockListEditor::apply`] turns `(blocks, intent)` into a new
//! sequence plus an optional [`FocusTarget`], and the caller commits the
//! sequence before moving focus.
//!
//! ```text
//! InlineEvent / DragEnd / slash text
//!        │
//!        ▼
//!   keys::route_key ──► Intent ──► BlockListEditor::apply
//!                                     │        │
//!                          convert_block    content adapter
//!                                     │
//!                                     ▼
//!                          Applied { blocks, focus }
//! ```

pub mod content;
pub mod convert;
pub mod editor;
pub mod focus;
pub mod inline;
pub mod intent;
pub mod keys;
pub mod markdown;
pub mod slash;

pub use content::{
    document_word_count, empty_payload_for, extract_plain_text, strip_code_escaping,
    with_plain_text, word_count,
};
pub use convert::convert_block;
pub use editor::{BlockListEditor, IdSource, SequentialIds, UuidIds};
pub use focus::FocusRegistry;
pub use inline::{DragEnd, InlineContentEditor, InlineEvent, Key, Modifiers};
pub use intent::{Applied, BlockPatch, Caret, FocusTarget, Intent};
pub use keys::{KeyRoute, route_key, route_title_enter};
pub use markdown::{export_markdown, import_markdown};
pub use slash::{SLASH_COMMANDS, parse_slash_command};
