//! The boundary to the rich-text surface that actually renders a block.
//!
//! Folio never draws text. Each mounted block is backed by something that
//! implements [`InlineContentEditor`]; it reports [`InlineEvent`]s and the
//! session answers with intents and commands back through the trait.

use folio_types::{BlockContent, BlockId};
use serde::{Deserialize, Serialize};

use crate::intent::{Caret, Intent};

/// An inline editor instance bound to one block.
pub trait InlineContentEditor {
    fn plain_text(&self) -> String;

    fn structured_content(&self) -> BlockContent;

    fn is_empty(&self) -> bool {
        self.plain_text().is_empty()
    }

    fn is_focused(&self) -> bool;

    /// Take keyboard focus with the caret at `caret`.
    fn focus(&mut self, caret: Caret);

    /// Replace everything the editor shows.
    fn set_content(&mut self, content: &BlockContent);

    /// Insert at the caret.
    fn insert_plain_text(&mut self, text: &str);
}

/// Keys the block list cares about. Everything else is `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    Char(char),
    Other(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Lifecycle events an inline editor raises.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InlineEvent {
    TextChanged,
    Focus,
    Blur,
    Key { key: Key, modifiers: Modifiers },
}

/// A finished drag from the reorder gesture source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEnd {
    pub active: BlockId,
    /// `None` when dropped outside any block.
    pub over: Option<BlockId>,
}

impl DragEnd {
    /// The move this drop requests, if any.
    pub fn into_intent(self) -> Option<Intent> {
        let over = self.over?;
        if over == self.active {
            return None;
        }
        Some(Intent::MoveViaDrag {
            from: self.active,
            to: over,
        })
    }
}
