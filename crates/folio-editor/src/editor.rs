//! The block list reducer.
//!
//! [`BlockListEditor::apply`] is `(blocks, intent) -> (blocks', focus)`. It
//! holds no document state of its own, only the id source, so every intent
//! can be exercised in isolation. Nothing here is fallible: unknown ids and
//! guard rejections (last block, first-block merge) come back unchanged.

use folio_types::{Block, BlockId, BlockKind};
use tracing::{debug, trace};

use crate::content::{
    append_plain_text, empty_payload_for, extract_plain_text, is_empty, last_list_item_is_empty,
    pop_last_list_item, push_list_item,
};
use crate::convert::convert_block;
use crate::intent::{Applied, BlockPatch, FocusTarget, Intent};
use crate::markdown::import_markdown;
use crate::slash::{matches_command, parse_slash_command};

/// Mints block ids. Implementations must never hand out the same id twice.
pub trait IdSource {
    fn next_id(&mut self) -> BlockId;

    /// Called with every sequence the editor sees, so counters can skip
    /// past ids loaded from storage.
    fn observe(&mut self, _blocks: &[Block]) {}
}

/// UUIDv7 ids. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> BlockId {
        BlockId::generate()
    }
}

/// Monotonic integer ids: "1", "2", ...
///
/// Never goes backwards, so ids freed by deletion are not reused.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> BlockId {
        let id = BlockId::new(self.next.to_string());
        self.next = self.next.saturating_add(1);
        id
    }

    /// Ids with no successor (`u64::MAX`) are left out; they can never be
    /// minted anyway.
    fn observe(&mut self, blocks: &[Block]) {
        let after = blocks
            .iter()
            .filter_map(|b| b.id.as_number())
            .filter_map(|n| n.checked_add(1))
            .max();
        if let Some(after) = after {
            self.next = self.next.max(after);
        }
    }
}

fn position(blocks: &[Block], id: &BlockId) -> Option<usize> {
    blocks.iter().position(|b| &b.id == id)
}

/// Applies intents to block sequences.
#[derive(Debug, Default)]
pub struct BlockListEditor<I = UuidIds> {
    ids: I,
}

impl BlockListEditor<UuidIds> {
    pub fn new() -> Self {
        Self { ids: UuidIds }
    }
}

impl<I: IdSource> BlockListEditor<I> {
    pub fn with_ids(ids: I) -> Self {
        Self { ids }
    }

    /// Mint a fresh block of `kind` with its canonical empty payload.
    pub fn create_block(&mut self, kind: BlockKind) -> Block {
        Block::new(self.ids.next_id(), kind).with_content(empty_payload_for(kind))
    }

    /// A sequence the editor can work on: `blocks` itself, or one empty
    /// paragraph when it is empty.
    pub fn ensure_non_empty(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        self.ids.observe(&blocks);
        if blocks.is_empty() {
            vec![self.create_block(BlockKind::Paragraph)]
        } else {
            blocks
        }
    }

    /// Apply one intent.
    pub fn apply(&mut self, blocks: &[Block], intent: Intent) -> Applied {
        self.ids.observe(blocks);
        trace!(intent = intent.name(), block_id = %intent.block_id(), "apply");

        let applied = match intent {
            Intent::SplitAfter { block_id, kind } => self.split_after(blocks, &block_id, kind),
            Intent::DeleteBackwardMerge { block_id } => delete_backward_merge(blocks, &block_id),
            Intent::DeleteBlock { block_id } => delete_block(blocks, &block_id),
            Intent::UpdateBlockContent { block_id, patch } => {
                update_block_content(blocks, &block_id, patch)
            }
            Intent::ConvertFormat { block_id, target } => convert_format(blocks, &block_id, target),
            Intent::Reorder {
                block_id,
                target_index,
            } => reorder(blocks, &block_id, target_index),
            Intent::MoveViaDrag { from, to } => move_via_drag(blocks, &from, &to),
            Intent::SlashCommand { block_id, command } => {
                slash_command(blocks, &block_id, &command)
            }
            Intent::EnterOnListItem { block_id } => self.enter_on_list_item(blocks, &block_id),
            Intent::PasteText { block_id, text } => self.paste_text(blocks, &block_id, &text),
            Intent::SetLanguage { block_id, language } => {
                set_language(blocks, &block_id, language)
            }
        };

        debug_assert!(applied.blocks.len() >= blocks.len().min(1));
        applied
    }

    fn split_after(&mut self, blocks: &[Block], id: &BlockId, kind: BlockKind) -> Applied {
        let Some(idx) = position(blocks, id) else {
            debug!(block_id = %id, "split_after: unknown block");
            return Applied::unchanged(blocks);
        };
        let block = self.create_block(kind);
        let focus = FocusTarget::block_start(block.id.clone());
        let mut next = blocks.to_vec();
        next.insert(idx + 1, block);
        Applied::changed(next, Some(focus))
    }

    fn enter_on_list_item(&mut self, blocks: &[Block], id: &BlockId) -> Applied {
        let Some(idx) = position(blocks, id) else {
            debug!(block_id = %id, "enter_on_list_item: unknown block");
            return Applied::unchanged(blocks);
        };
        let block = &blocks[idx];
        if !block.kind.is_list() {
            debug!(block_id = %id, kind = %block.kind, "enter_on_list_item: not a list");
            return Applied::unchanged(blocks);
        }

        // Whole list empty: Enter leaves the list.
        if extract_plain_text(&block.content).trim().is_empty() {
            let mut next = blocks.to_vec();
            next[idx] = Block::new(block.id.clone(), BlockKind::Paragraph)
                .with_content(empty_payload_for(BlockKind::Paragraph));
            return Applied::changed(next, Some(FocusTarget::block_start(block.id.clone())));
        }

        // Trailing empty item: drop it and continue in a paragraph below.
        if last_list_item_is_empty(&block.content) {
            let mut next = blocks.to_vec();
            next[idx].content = pop_last_list_item(&block.content);
            let para = self.create_block(BlockKind::Paragraph);
            let focus = FocusTarget::block_start(para.id.clone());
            next.insert(idx + 1, para);
            return Applied::changed(next, Some(focus));
        }

        let mut next = blocks.to_vec();
        next[idx].content = push_list_item(&block.content, block.kind);
        Applied::changed(next, Some(FocusTarget::block_end(block.id.clone())))
    }

    fn paste_text(&mut self, blocks: &[Block], id: &BlockId, text: &str) -> Applied {
        if !text.contains('\n') {
            trace!(block_id = %id, "paste_text: single line left to the inline editor");
            return Applied::unchanged(blocks);
        }
        let Some(idx) = position(blocks, id) else {
            debug!(block_id = %id, "paste_text: unknown block");
            return Applied::unchanged(blocks);
        };
        let pasted = import_markdown(text, &mut self.ids);
        let Some(last) = pasted.last() else {
            return Applied::unchanged(blocks);
        };
        let focus = FocusTarget::block_end(last.id.clone());

        let mut next = blocks.to_vec();
        let at = if is_empty(&blocks[idx].content) {
            next.remove(idx);
            idx
        } else {
            idx + 1
        };
        let tail = next.split_off(at);
        next.extend(pasted);
        next.extend(tail);
        Applied::changed(next, Some(focus))
    }
}

fn delete_backward_merge(blocks: &[Block], id: &BlockId) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "delete_backward_merge: unknown block");
        return Applied::unchanged(blocks);
    };
    if idx == 0 {
        debug!(block_id = %id, "delete_backward_merge: first block, focusing title");
        return Applied {
            focus: Some(FocusTarget::Title),
            ..Applied::unchanged(blocks)
        };
    }

    let mut next = blocks.to_vec();
    let removed = next.remove(idx);
    let prev = &mut next[idx - 1];
    let text = extract_plain_text(&removed.content);
    if !text.is_empty() {
        prev.content = append_plain_text(&prev.content, &text);
    }
    let focus = FocusTarget::block_end(prev.id.clone());
    Applied::changed(next, Some(focus))
}

fn delete_block(blocks: &[Block], id: &BlockId) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "delete_block: unknown block");
        return Applied::unchanged(blocks);
    };
    if blocks.len() == 1 {
        debug!(block_id = %id, "delete_block: refusing to delete the last block");
        return Applied::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    next.remove(idx);
    let focus = if idx > 0 {
        FocusTarget::block_end(next[idx - 1].id.clone())
    } else {
        FocusTarget::block_start(next[0].id.clone())
    };
    Applied::changed(next, Some(focus))
}

fn update_block_content(blocks: &[Block], id: &BlockId, patch: BlockPatch) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "update_block_content: unknown block");
        return Applied::unchanged(blocks);
    };
    let mut next = blocks.to_vec();
    let block = &mut next[idx];
    if let Some(content) = patch.content {
        block.content = content;
    }
    if let Some(kind) = patch.kind {
        block.kind = kind;
    }
    if let Some(language) = patch.language {
        block.language = language;
    }
    if !block.kind.is_code() {
        block.language = None;
    }
    Applied::changed(next, None)
}

fn convert_format(blocks: &[Block], id: &BlockId, target: BlockKind) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "convert_format: unknown block");
        return Applied::unchanged(blocks);
    };
    if blocks[idx].kind == target {
        return Applied::unchanged(blocks);
    }
    let converted = convert_block(&blocks[idx], target);
    let patch = BlockPatch {
        content: Some(converted.content),
        kind: Some(converted.kind),
        language: Some(converted.language),
    };
    update_block_content(blocks, id, patch)
}

/// Remove-then-insert. `target_index` is an index into the current
/// sequence; anything outside it is a no-op.
fn reorder(blocks: &[Block], id: &BlockId, target_index: usize) -> Applied {
    let Some(from) = position(blocks, id) else {
        debug!(block_id = %id, "reorder: unknown block");
        return Applied::unchanged(blocks);
    };
    if target_index >= blocks.len() {
        debug!(block_id = %id, target_index, len = blocks.len(), "reorder: index out of bounds");
        return Applied::unchanged(blocks);
    }
    if from == target_index {
        return Applied::unchanged(blocks);
    }

    let mut next = blocks.to_vec();
    let moved = next.remove(from);
    next.insert(target_index, moved);
    Applied::changed(next, None)
}

fn move_via_drag(blocks: &[Block], from: &BlockId, to: &BlockId) -> Applied {
    if from == to {
        return Applied::unchanged(blocks);
    }
    let Some(target_index) = position(blocks, to) else {
        debug!(from = %from, to = %to, "move_via_drag: unknown drop target");
        return Applied::unchanged(blocks);
    };
    reorder(blocks, from, target_index)
}

fn slash_command(blocks: &[Block], id: &BlockId, command: &str) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "slash_command: unknown block");
        return Applied::unchanged(blocks);
    };
    let text = extract_plain_text(&blocks[idx].content);
    if !matches_command(&text, command) {
        trace!(block_id = %id, command, "slash_command: block text is not the command");
        return Applied::unchanged(blocks);
    }
    let Some(target) = parse_slash_command(command) else {
        trace!(block_id = %id, command, "slash_command: unrecognized");
        return Applied::unchanged(blocks);
    };

    // Content is cleared here, so this is a silent kind change rather than a
    // conversion.
    let patch = BlockPatch {
        content: Some(empty_payload_for(target)),
        kind: Some(target),
        language: Some(None),
    };
    let mut applied = update_block_content(blocks, id, patch);
    applied.focus = Some(FocusTarget::block_start(id.clone()));
    applied
}

fn set_language(blocks: &[Block], id: &BlockId, language: Option<String>) -> Applied {
    let Some(idx) = position(blocks, id) else {
        debug!(block_id = %id, "set_language: unknown block");
        return Applied::unchanged(blocks);
    };
    if !blocks[idx].kind.is_code() {
        debug!(block_id = %id, "set_language: not a code block");
        return Applied::unchanged(blocks);
    }
    let language = language.filter(|l| !l.trim().is_empty());
    update_block_content(blocks, id, BlockPatch::default().with_language(language))
}
