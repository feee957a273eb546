//! Editing intents and their results.
//!
//! Intents are plain data: the inline editor adapter, the drag source and
//! the CLI all build them and hand them straight to
//! [`BlockListEditor::apply`](crate::BlockListEditor::apply). On the wire
//! they are tagged JSON objects:
//!
//! ```json
//! {"intent": "split_after", "block_id": "1", "type": "heading2"}
//! {"intent": "move_via_drag", "from": "3", "to": "1"}
//! ```

use folio_types::{Block, BlockContent, BlockId, BlockKind};
use serde::{Deserialize, Deserializer, Serialize};

/// A discrete editing operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Insert an empty block of `kind` right after `block_id`.
    SplitAfter {
        block_id: BlockId,
        #[serde(rename = "type", default)]
        kind: BlockKind,
    },
    /// Backspace at the start of a block: remove it, land in the previous one.
    DeleteBackwardMerge { block_id: BlockId },
    /// Remove a block outright.
    DeleteBlock { block_id: BlockId },
    /// Shallow-merge fields into a block without rewriting content.
    UpdateBlockContent { block_id: BlockId, patch: BlockPatch },
    /// Text-preserving kind change.
    ConvertFormat {
        block_id: BlockId,
        #[serde(rename = "type")]
        target: BlockKind,
    },
    /// Move a block to `target_index` (remove first, then insert).
    Reorder { block_id: BlockId, target_index: usize },
    /// Drag `from` onto `to`; lands at `to`'s current index.
    MoveViaDrag { from: BlockId, to: BlockId },
    /// Complete a slash command typed into `block_id`.
    SlashCommand { block_id: BlockId, command: String },
    /// Enter pressed inside a list block.
    #[serde(alias = "enter_on_empty_list_item")]
    EnterOnListItem { block_id: BlockId },
    /// Multi-line paste, parsed as markdown into new blocks.
    PasteText { block_id: BlockId, text: String },
    /// Set or clear a code block's language.
    SetLanguage {
        block_id: BlockId,
        #[serde(default)]
        language: Option<String>,
    },
}

impl Intent {
    /// The block an intent is aimed at (`from` for drags).
    pub fn block_id(&self) -> &BlockId {
        match self {
            Intent::SplitAfter { block_id, .. }
            | Intent::DeleteBackwardMerge { block_id }
            | Intent::DeleteBlock { block_id }
            | Intent::UpdateBlockContent { block_id, .. }
            | Intent::ConvertFormat { block_id, .. }
            | Intent::Reorder { block_id, .. }
            | Intent::SlashCommand { block_id, .. }
            | Intent::EnterOnListItem { block_id }
            | Intent::PasteText { block_id, .. }
            | Intent::SetLanguage { block_id, .. } => block_id,
            Intent::MoveViaDrag { from, .. } => from,
        }
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SplitAfter { .. } => "split_after",
            Intent::DeleteBackwardMerge { .. } => "delete_backward_merge",
            Intent::DeleteBlock { .. } => "delete_block",
            Intent::UpdateBlockContent { .. } => "update_block_content",
            Intent::ConvertFormat { .. } => "convert_format",
            Intent::Reorder { .. } => "reorder",
            Intent::MoveViaDrag { .. } => "move_via_drag",
            Intent::SlashCommand { .. } => "slash_command",
            Intent::EnterOnListItem { .. } => "enter_on_list_item",
            Intent::PasteText { .. } => "paste_text",
            Intent::SetLanguage { .. } => "set_language",
        }
    }
}

/// Fields to shallow-merge into a block. Absent fields are left alone.
///
/// `language` distinguishes "absent" from an explicit `null`, which clears it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub language: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl BlockPatch {
    pub fn content(content: impl Into<BlockContent>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn kind(kind: BlockKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<BlockContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = Some(language);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.kind.is_none() && self.language.is_none()
    }
}

/// Where the caret should land inside a focused block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Caret {
    Start,
    End,
}

/// What should receive focus once the new sequence is committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum FocusTarget {
    Block { id: BlockId, caret: Caret },
    /// The document title field.
    Title,
}

impl FocusTarget {
    pub fn block_start(id: BlockId) -> Self {
        FocusTarget::Block { id, caret: Caret::Start }
    }

    pub fn block_end(id: BlockId) -> Self {
        FocusTarget::Block { id, caret: Caret::End }
    }

    pub fn block_id(&self) -> Option<&BlockId> {
        match self {
            FocusTarget::Block { id, .. } => Some(id),
            FocusTarget::Title => None,
        }
    }
}

/// Result of applying one intent.
///
/// `focus` is only meaningful after `blocks` has replaced the caller's
/// sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    pub blocks: Vec<Block>,
    pub focus: Option<FocusTarget>,
    /// False for every no-op path (unknown ids, guard rejections).
    pub changed: bool,
}

impl Applied {
    pub(crate) fn unchanged(blocks: &[Block]) -> Self {
        Self {
            blocks: blocks.to_vec(),
            focus: None,
            changed: false,
        }
    }

    pub(crate) fn changed(blocks: Vec<Block>, focus: Option<FocusTarget>) -> Self {
        Self {
            blocks,
            focus,
            changed: true,
        }
    }

    pub fn focus_block(&self) -> Option<&BlockId> {
        self.focus.as_ref().and_then(FocusTarget::block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_wire_format() {
        let intent: Intent =
            serde_json::from_str(r#"{"intent":"split_after","block_id":"1"}"#).unwrap();
        assert_eq!(
            intent,
            Intent::SplitAfter {
                block_id: BlockId::new("1"),
                kind: BlockKind::Paragraph
            }
        );

        let intent: Intent =
            serde_json::from_str(r#"{"intent":"convert_format","block_id":"2","type":"h1"}"#)
                .unwrap();
        assert_eq!(intent.name(), "convert_format");
        assert_eq!(intent.block_id(), &BlockId::new("2"));

        let intent: Intent =
            serde_json::from_str(r#"{"intent":"enter_on_empty_list_item","block_id":"3"}"#)
                .unwrap();
        assert!(matches!(intent, Intent::EnterOnListItem { .. }));
    }

    #[test]
    fn test_patch_language_null_vs_absent() {
        let absent: BlockPatch = serde_json::from_str(r#"{"type":"code"}"#).unwrap();
        assert_eq!(absent.language, None);
        assert_eq!(absent.kind, Some(BlockKind::Code));

        let cleared: BlockPatch = serde_json::from_str(r#"{"language":null}"#).unwrap();
        assert_eq!(cleared.language, Some(None));

        let set: BlockPatch = serde_json::from_str(r#"{"language":"rust"}"#).unwrap();
        assert_eq!(set.language, Some(Some("rust".into())));
    }

    #[test]
    fn test_focus_target_accessors() {
        let f = FocusTarget::block_end(BlockId::new("9"));
        assert_eq!(f.block_id(), Some(&BlockId::new("9")));
        assert_eq!(FocusTarget::Title.block_id(), None);
    }
}
