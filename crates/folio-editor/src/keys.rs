//! Key routing: which keystrokes become block intents.

use folio_types::{Block, BlockId, BlockKind};

use crate::content::extract_plain_text;
use crate::inline::{Key, Modifiers};
use crate::intent::Intent;
use crate::slash::parse_slash_command;

/// What to do with a keystroke.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyRoute {
    /// Hand this intent to the block list editor.
    Intent(Intent),
    /// Move focus to the document title.
    FocusTitle,
    /// Let the inline editor handle it.
    Inline,
}

/// Route a key pressed inside `block_id`.
///
/// `is_empty` comes from the inline editor, which knows about content the
/// block sequence has not seen yet.
pub fn route_key(
    blocks: &[Block],
    block_id: &BlockId,
    key: &Key,
    modifiers: Modifiers,
    is_empty: bool,
) -> KeyRoute {
    let Some(idx) = blocks.iter().position(|b| &b.id == block_id) else {
        return KeyRoute::Inline;
    };
    let kind = blocks[idx].kind;

    match key {
        Key::Enter if modifiers.shift => KeyRoute::Inline,
        Key::Enter if kind.is_code() => KeyRoute::Inline,
        Key::Enter if modifiers.is_none() && is_slash_command(&blocks[idx]) => {
            KeyRoute::Intent(Intent::SlashCommand {
                block_id: block_id.clone(),
                command: extract_plain_text(&blocks[idx].content),
            })
        }
        Key::Enter if kind.is_list() => KeyRoute::Intent(Intent::EnterOnListItem {
            block_id: block_id.clone(),
        }),
        Key::Enter if modifiers.is_none() => KeyRoute::Intent(Intent::SplitAfter {
            block_id: block_id.clone(),
            kind: BlockKind::Paragraph,
        }),
        Key::Backspace if is_empty && idx == 0 => KeyRoute::FocusTitle,
        Key::Backspace if is_empty => KeyRoute::Intent(Intent::DeleteBackwardMerge {
            block_id: block_id.clone(),
        }),
        _ => KeyRoute::Inline,
    }
}

/// Enter commits a block whose whole text is a slash command.
fn is_slash_command(block: &Block) -> bool {
    parse_slash_command(&extract_plain_text(&block.content)).is_some()
}

/// Enter in the title field moves to the first block.
pub fn route_title_enter(blocks: &[Block]) -> Option<BlockId> {
    blocks.first().map(|b| b.id.clone())
}
