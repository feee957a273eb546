//! Block and document types for Folio.
//!
//! This is the leaf crate of the workspace: typed ids, blocks, documents and
//! the snapshot unit the autosave path compares. It has **no internal folio
//! dependencies**.
//!
//! ```text
//! Document (DocumentId, assigned by the repository)
//!     └── title
//!     └── blocks: ordered, never empty while edited
//!           └── Block (BlockId, BlockKind, BlockContent, language?)
//! ```
//!
//! |-----------------|------------------------------------------------|
//! | Type            | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | [`BlockId`]     | Stable block identity, never reused            |
//! | [`DocumentId`]  | Repository-assigned document number            |
//! | [`BlockKind`]   | What a block renders as                        |
//! | [`Block`]       | One independently editable unit                |
//! | [`Document`]    | Title + blocks + timestamps                    |
//! | [`Snapshot`]    | `(title, blocks)`, the unit of change detection |
//! |-----------------|------------------------------------------------|

pub mod block;
pub mod document;
pub mod ids;

pub use block::{Block, BlockContent, BlockKind, RichNode, count_words};
pub use document::{Document, Snapshot};
pub use ids::{BlockId, DocumentId};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
