//! Content adapter: plain text in and out of block content payloads.
//!
//! Structured content follows the inline editor's node tree. The adapter
//! only knows which node types are *textblocks* (hold inline runs) and which
//! are *lists* (hold `listItem`s); everything else is walked generically, so
//! unknown node types still contribute their text.

use folio_types::{Block, BlockContent, BlockKind, RichNode, count_words};

const TEXTBLOCKS: &[&str] = &["paragraph", "heading", "title", "codeBlock"];
const LISTS: &[&str] = &["bulletList", "orderedList", "dashedList"];
const BLOCK_NODES: &[&str] = &[
    "doc",
    "paragraph",
    "heading",
    "title",
    "codeBlock",
    "bulletList",
    "orderedList",
    "dashedList",
    "listItem",
    "blockquote",
];

fn is_textblock(node: &RichNode) -> bool {
    TEXTBLOCKS.contains(&node.kind.as_str())
}

fn is_list(node: &RichNode) -> bool {
    LISTS.contains(&node.kind.as_str())
}

fn is_block_node(node: &RichNode) -> bool {
    BLOCK_NODES.contains(&node.kind.as_str())
}

/// Plain text of a content payload.
///
/// Marks are dropped, hard breaks become `\n`, and sibling block-level nodes
/// (paragraphs, list items) are joined with `\n`. No trimming happens here.
pub fn extract_plain_text(content: &BlockContent) -> String {
    match content {
        BlockContent::Text(text) => text.clone(),
        BlockContent::Rich(node) => node_text(node),
    }
}

fn node_text(node: &RichNode) -> String {
    if node.is_text() {
        return node.text.clone().unwrap_or_default();
    }
    if node.kind == "hardBreak" {
        return "\n".to_string();
    }
    if node.content.iter().any(is_block_node) {
        node.content
            .iter()
            .map(node_text)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        node.content.iter().map(node_text).collect()
    }
}

/// True when the payload has no text at all.
pub fn is_empty(content: &BlockContent) -> bool {
    extract_plain_text(content).is_empty()
}

/// Canonical empty payload for a block kind.
///
/// Lists get one empty `listItem`; everything else gets a single empty
/// textblock of the matching shape.
pub fn empty_payload_for(kind: BlockKind) -> BlockContent {
    let inner = match kind {
        BlockKind::Title => RichNode::element("title", vec![]),
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
            let level = kind.heading_level().unwrap_or(1);
            RichNode::element("heading", vec![]).with_attr("level", level)
        }
        BlockKind::Paragraph | BlockKind::Markdown => RichNode::element("paragraph", vec![]),
        BlockKind::Code => RichNode::element("codeBlock", vec![]),
        BlockKind::BulletList | BlockKind::OrderedList | BlockKind::DashedList => {
            RichNode::element(list_node_name(kind), vec![empty_list_item()])
        }
    };
    BlockContent::Rich(RichNode::element("doc", vec![inner]))
}

fn list_node_name(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::OrderedList => "orderedList",
        BlockKind::DashedList => "dashedList",
        _ => "bulletList",
    }
}

fn empty_list_item() -> RichNode {
    RichNode::element("listItem", vec![RichNode::element("paragraph", vec![])])
}

/// The empty payload for `kind` with `text` as one run in its primary slot.
pub fn with_plain_text(kind: BlockKind, text: &str) -> BlockContent {
    let mut content = empty_payload_for(kind);
    if !text.is_empty() {
        if let BlockContent::Rich(root) = &mut content {
            if let Some(slot) = first_textblock_mut(root) {
                slot.content.push(RichNode::text(text));
            }
        }
    }
    content
}

fn first_textblock_mut(node: &mut RichNode) -> Option<&mut RichNode> {
    if is_textblock(node) {
        return Some(node);
    }
    node.content.iter_mut().find_map(first_textblock_mut)
}

fn last_textblock_mut(node: &mut RichNode) -> Option<&mut RichNode> {
    if is_textblock(node) {
        return Some(node);
    }
    node.content.iter_mut().rev().find_map(last_textblock_mut)
}

/// Append `text` to the end of a payload (last textblock for rich content).
pub fn append_plain_text(content: &BlockContent, text: &str) -> BlockContent {
    if text.is_empty() {
        return content.clone();
    }
    match content {
        BlockContent::Text(existing) => BlockContent::Text(format!("{existing}{text}")),
        BlockContent::Rich(root) => {
            let mut root = root.clone();
            match last_textblock_mut(&mut root) {
                Some(slot) => slot.content.push(RichNode::text(text)),
                None => root
                    .content
                    .push(RichNode::element("paragraph", vec![RichNode::text(text)])),
            }
            BlockContent::Rich(root)
        }
    }
}

fn first_list(node: &RichNode) -> Option<&RichNode> {
    if is_list(node) {
        return Some(node);
    }
    node.content.iter().find_map(first_list)
}

fn first_list_mut(node: &mut RichNode) -> Option<&mut RichNode> {
    if is_list(node) {
        return Some(node);
    }
    node.content.iter_mut().find_map(first_list_mut)
}

/// Number of items in a list payload. Plain text counts one item per line.
pub fn list_item_count(content: &BlockContent) -> usize {
    match content {
        BlockContent::Text(text) => text.split('\n').count(),
        BlockContent::Rich(root) => first_list(root).map_or(0, |list| list.content.len()),
    }
}

/// True when the last list item holds no text.
///
/// A payload without a list node (a kind changed without conversion) is one
/// item holding all of its text.
pub fn last_list_item_is_empty(content: &BlockContent) -> bool {
    match content {
        BlockContent::Text(text) => text.is_empty() || text.ends_with('\n'),
        BlockContent::Rich(root) => match first_list(root) {
            Some(list) => list
                .content
                .last()
                .is_none_or(|item| node_text(item).is_empty()),
            None => node_text(root).is_empty(),
        },
    }
}

/// A `kind` list payload with one item per entry.
pub fn list_with_items(kind: BlockKind, items: &[String]) -> BlockContent {
    if items.is_empty() {
        return empty_payload_for(kind);
    }
    let items = items
        .iter()
        .map(|text| {
            let para = if text.is_empty() {
                RichNode::element("paragraph", vec![])
            } else {
                RichNode::element("paragraph", vec![RichNode::text(text.as_str())])
            };
            RichNode::element("listItem", vec![para])
        })
        .collect();
    let list = RichNode::element(list_node_name(kind), items);
    BlockContent::Rich(RichNode::element("doc", vec![list]))
}

/// Text of each list item. Plain text yields one item per line.
pub fn list_item_texts(content: &BlockContent) -> Vec<String> {
    match content {
        BlockContent::Text(text) => text.split('\n').map(str::to_string).collect(),
        BlockContent::Rich(root) => match first_list(root) {
            Some(list) => list.content.iter().map(node_text).collect(),
            None => vec![node_text(root)],
        },
    }
}

/// Append an empty list item.
///
/// Rich payloads without a list node are rebuilt as a `kind` list holding
/// their text in the first item.
pub fn push_list_item(content: &BlockContent, kind: BlockKind) -> BlockContent {
    match content {
        BlockContent::Text(text) => BlockContent::Text(format!("{text}\n")),
        BlockContent::Rich(root) => {
            let mut root = root.clone();
            if let Some(list) = first_list_mut(&mut root) {
                list.content.push(empty_list_item());
                return BlockContent::Rich(root);
            }
            let rebuilt = with_plain_text(kind, &node_text(&root));
            push_list_item(&rebuilt, kind)
        }
    }
}

/// Drop the last list item. A list never drops below one item.
pub fn pop_last_list_item(content: &BlockContent) -> BlockContent {
    match content {
        BlockContent::Text(text) => {
            BlockContent::Text(text.strip_suffix('\n').unwrap_or(text).to_string())
        }
        BlockContent::Rich(root) => {
            let mut root = root.clone();
            if let Some(list) = first_list_mut(&mut root) {
                if list.content.len() > 1 {
                    list.content.pop();
                }
            }
            BlockContent::Rich(root)
        }
    }
}

/// The language a block reports: its own field, then the `codeBlock`
/// attribute, then a fence info string in plain-text content.
pub fn reported_language(block: &Block) -> Option<String> {
    if let Some(lang) = block.language.as_ref().filter(|l| !l.is_empty()) {
        return Some(lang.clone());
    }
    match &block.content {
        BlockContent::Rich(root) => code_block_language(root),
        BlockContent::Text(text) => fence_language(text),
    }
}

fn code_block_language(node: &RichNode) -> Option<String> {
    if node.kind == "codeBlock" {
        return node
            .attr_str("language")
            .filter(|l| !l.is_empty())
            .map(str::to_string);
    }
    node.content.iter().find_map(code_block_language)
}

fn fence_language(text: &str) -> Option<String> {
    let first = text.trim_start().lines().next()?;
    let info = first.strip_prefix("```")?.trim();
    let lang = info.split_whitespace().next()?;
    Some(lang.to_string())
}

/// Undo code-specific escaping: one wrapping ``` fence and the HTML
/// entities code blocks are stored with.
pub fn strip_code_escaping(text: &str) -> String {
    let unfenced = strip_fence(text).unwrap_or(text);
    unfenced
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn strip_fence(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix("```")?;
    let body_start = rest.find('\n')?;
    let body = rest[body_start + 1..].strip_suffix("```")?;
    Some(body.strip_suffix('\n').unwrap_or(body))
}

/// Words in one payload.
pub fn word_count(content: &BlockContent) -> usize {
    count_words(&extract_plain_text(content))
}

/// Words across a whole document.
pub fn document_word_count(blocks: &[Block]) -> usize {
    blocks.iter().map(|b| word_count(&b.content)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::BlockId;

    fn rich(json: &str) -> BlockContent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_empty_payloads_have_no_text() {
        for kind in BlockKind::ALL {
            assert_eq!(extract_plain_text(&empty_payload_for(kind)), "", "{kind}");
        }
    }

    #[test]
    fn test_list_payload_shape() {
        let content = empty_payload_for(BlockKind::OrderedList);
        let BlockContent::Rich(root) = content else {
            panic!("expected rich payload");
        };
        assert_eq!(root.kind, "doc");
        assert_eq!(root.content[0].kind, "orderedList");
        assert_eq!(root.content[0].content[0].kind, "listItem");
    }

    #[test]
    fn test_heading_payload_level() {
        let BlockContent::Rich(root) = empty_payload_for(BlockKind::Heading3) else {
            panic!("expected rich payload");
        };
        assert_eq!(root.content[0].kind, "heading");
        assert_eq!(root.content[0].attrs["level"], 3);
    }

    #[test]
    fn test_extract_drops_marks_and_keeps_breaks() {
        let content = rich(
            r#"{"type":"doc","content":[
                {"type":"paragraph","content":[
                    {"type":"text","text":"bold","marks":[{"type":"bold"}]},
                    {"type":"text","text":" and "},
                    {"type":"hardBreak"},
                    {"type":"text","text":"link","marks":[{"type":"link","attrs":{"href":"x"}}]}
                ]},
                {"type":"paragraph","content":[{"type":"text","text":"second"}]}
            ]}"#,
        );
        assert_eq!(extract_plain_text(&content), "bold and \nlink\nsecond");
    }

    #[test]
    fn test_extract_does_not_trim() {
        assert_eq!(extract_plain_text(&BlockContent::Text("  pad  ".into())), "  pad  ");
    }

    #[test]
    fn test_with_plain_text_places_single_run() {
        let content = with_plain_text(BlockKind::BulletList, "one\ntwo");
        assert_eq!(list_item_count(&content), 1);
        assert_eq!(extract_plain_text(&content), "one\ntwo");
    }

    #[test]
    fn test_append_plain_text() {
        let base = with_plain_text(BlockKind::Paragraph, "hello");
        assert_eq!(extract_plain_text(&append_plain_text(&base, " world")), "hello world");
        let plain = BlockContent::Text("a".into());
        assert_eq!(append_plain_text(&plain, "b"), BlockContent::Text("ab".into()));
    }

    #[test]
    fn test_list_item_push_and_pop() {
        let one = with_plain_text(BlockKind::BulletList, "first");
        assert!(!last_list_item_is_empty(&one));

        let two = push_list_item(&one, BlockKind::BulletList);
        assert_eq!(list_item_count(&two), 2);
        assert!(last_list_item_is_empty(&two));
        assert_eq!(extract_plain_text(&two), "first\n");

        let back = pop_last_list_item(&two);
        assert_eq!(back, one);
    }

    #[test]
    fn test_list_with_items() {
        let items = vec!["a".to_string(), "b".to_string()];
        let content = list_with_items(BlockKind::OrderedList, &items);
        assert_eq!(list_item_count(&content), 2);
        assert_eq!(list_item_texts(&content), items);
        assert_eq!(list_with_items(BlockKind::BulletList, &[]), empty_payload_for(BlockKind::BulletList));
    }

    #[test]
    fn test_plain_text_lists_use_lines() {
        let content = BlockContent::Text("a".into());
        let pushed = push_list_item(&content, BlockKind::DashedList);
        assert_eq!(pushed, BlockContent::Text("a\n".into()));
        assert!(last_list_item_is_empty(&pushed));
        assert_eq!(pop_last_list_item(&pushed), content);
    }

    #[test]
    fn test_reported_language() {
        let mut block = Block::new(BlockId::new("1"), BlockKind::Code);
        assert_eq!(reported_language(&block), None);

        block.content = rich(
            r#"{"type":"doc","content":[{"type":"codeBlock","attrs":{"language":"rust"}}]}"#,
        );
        assert_eq!(reported_language(&block).as_deref(), Some("rust"));

        block.language = Some("python".into());
        assert_eq!(reported_language(&block).as_deref(), Some("python"));

        let fenced = Block::new(BlockId::new("2"), BlockKind::Code)
            .with_content("```sh\nls -la\n```");
        assert_eq!(reported_language(&fenced).as_deref(), Some("sh"));
    }

    #[test]
    fn test_strip_code_escaping() {
        assert_eq!(strip_code_escaping("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(strip_code_escaping("```rust\nlet x = 1;\n```"), "let x = 1;");
        assert_eq!(strip_code_escaping("&amp;lt;"), "&lt;");
        assert_eq!(strip_code_escaping("say &quot;hi&quot; &#39;there&#39;"), "say \"hi\" 'there'");
    }

    #[test]
    fn test_word_counts() {
        let blocks = vec![
            Block::new(BlockId::new("1"), BlockKind::Paragraph).with_content("one two"),
            Block::new(BlockId::new("2"), BlockKind::Heading1)
                .with_content(with_plain_text(BlockKind::Heading1, "three")),
            Block::new(BlockId::new("3"), BlockKind::Paragraph),
        ];
        assert_eq!(document_word_count(&blocks), 3);
    }
}
