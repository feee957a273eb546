//! Documents and snapshots.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::ids::DocumentId;

/// A stored document: title plus an ordered block sequence.
///
/// `id` is `None` until the repository assigns one on first save.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub title: String,
    /// Rendering and traversal order.
    #[serde(rename = "content")]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Document {
    /// An unsaved document holding the given blocks.
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        let now = crate::now_millis();
        Self {
            id: None,
            title: title.into(),
            blocks,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            title: self.title.clone(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

/// The `(title, blocks)` pair autosave compares and persists.
///
/// Equality is deep and structural: two snapshots are equal iff every block
/// has the same id, kind, content tree and language, in the same order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Snapshot {
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            blocks,
        }
    }
}
