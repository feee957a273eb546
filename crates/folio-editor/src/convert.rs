//! Format transitions: change a block's kind, keep its visible text.
//!
//! Structure is never remapped. The old payload is flattened to plain text,
//! the target kind's empty payload is built, and the text goes back in as a
//! single run. Lists therefore always come out with exactly one item.

use folio_types::{Block, BlockKind};
use tracing::trace;

use crate::content::{extract_plain_text, reported_language, strip_code_escaping, with_plain_text};

/// Convert `block` to `target`. Never fails.
///
/// Converting to the current kind returns the block untouched. Converting to
/// code carries over whatever language the source reports (none means the
/// renderer's plaintext default); converting away from code drops it.
pub fn convert_block(block: &Block, target: BlockKind) -> Block {
    if block.kind == target {
        return block.clone();
    }

    let mut text = extract_plain_text(&block.content);
    if block.kind.is_code() {
        text = strip_code_escaping(&text);
    }

    let language = if target.is_code() {
        reported_language(block)
    } else {
        None
    };

    trace!(block_id = %block.id, from = %block.kind, to = %target, "convert block");

    Block {
        id: block.id.clone(),
        kind: target,
        content: with_plain_text(target, &text),
        language,
    }
}
