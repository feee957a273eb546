//! Markdown bridge: multi-line paste in, plain export out.
//!
//! Import is deliberately coarse. Inline emphasis collapses to plain text,
//! nested lists flatten into their top-level list, and block quotes unwrap
//! into paragraphs.

use folio_types::{Block, BlockKind};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use tracing::debug;

use crate::content::{
    extract_plain_text, list_item_texts, list_with_items, strip_code_escaping, with_plain_text,
};
use crate::editor::IdSource;

struct PendingBlock {
    kind: BlockKind,
    text: String,
    language: Option<String>,
}

struct PendingList {
    kind: BlockKind,
    items: Vec<String>,
    current: Option<String>,
    depth: u32,
}

impl PendingList {
    fn finish_item(&mut self) {
        if let Some(item) = self.current.take() {
            self.items.push(item.trim_end_matches('\n').to_string());
        }
    }
}

fn flush<S: IdSource + ?Sized>(
    pending: &mut Option<PendingBlock>,
    blocks: &mut Vec<Block>,
    ids: &mut S,
) {
    if let Some(p) = pending.take() {
        let text = p.text.trim_end_matches('\n');
        let mut block = Block::new(ids.next_id(), p.kind).with_content(with_plain_text(p.kind, text));
        block.language = p.language;
        blocks.push(block);
    }
}

fn heading_kind(level: HeadingLevel) -> BlockKind {
    match level {
        HeadingLevel::H1 => BlockKind::Heading1,
        HeadingLevel::H2 => BlockKind::Heading2,
        _ => BlockKind::Heading3,
    }
}

/// Parse markdown into fresh blocks, ids drawn from `ids`.
pub fn import_markdown<S: IdSource + ?Sized>(text: &str, ids: &mut S) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Option<PendingBlock> = None;
    let mut list: Option<PendingList> = None;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::List(first)) => {
                match list.as_mut() {
                    Some(l) => l.depth += 1,
                    None => {
                        flush(&mut pending, &mut blocks, ids);
                        let kind = if first.is_some() {
                            BlockKind::OrderedList
                        } else {
                            BlockKind::BulletList
                        };
                        list = Some(PendingList {
                            kind,
                            items: Vec::new(),
                            current: None,
                            depth: 1,
                        });
                    }
                }
            }
            Event::End(TagEnd::List(_)) => {
                if let Some(l) = list.as_mut() {
                    l.depth -= 1;
                    if l.depth == 0 {
                        l.finish_item();
                        let kind = l.kind;
                        let items = std::mem::take(&mut l.items);
                        list = None;
                        let content = list_with_items(kind, &items);
                        blocks.push(Block::new(ids.next_id(), kind).with_content(content));
                    }
                }
            }
            Event::Start(Tag::Item) => {
                if let Some(l) = list.as_mut() {
                    l.finish_item();
                    l.current = Some(String::new());
                }
            }
            Event::End(TagEnd::Item) => {
                if let Some(l) = list.as_mut() {
                    l.finish_item();
                }
            }

            Event::Start(Tag::Heading { level, .. }) if list.is_none() => {
                flush(&mut pending, &mut blocks, ids);
                pending = Some(PendingBlock {
                    kind: heading_kind(level),
                    text: String::new(),
                    language: None,
                });
            }
            Event::Start(Tag::Paragraph | Tag::HtmlBlock) if list.is_none() => {
                flush(&mut pending, &mut blocks, ids);
                pending = Some(PendingBlock {
                    kind: BlockKind::Paragraph,
                    text: String::new(),
                    language: None,
                });
            }
            Event::Start(Tag::CodeBlock(kind)) if list.is_none() => {
                flush(&mut pending, &mut blocks, ids);
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().map(str::to_string)
                    }
                    CodeBlockKind::Indented => None,
                };
                pending = Some(PendingBlock {
                    kind: BlockKind::Code,
                    text: String::new(),
                    language,
                });
            }
            Event::End(
                TagEnd::Heading(_) | TagEnd::Paragraph | TagEnd::CodeBlock | TagEnd::HtmlBlock,
            ) => {
                match list.as_mut() {
                    Some(l) => {
                        if let Some(item) = l.current.as_mut().filter(|i| !i.is_empty()) {
                            item.push('\n');
                        }
                    }
                    None => flush(&mut pending, &mut blocks, ids),
                }
            }

            Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                push_text(&mut list, &mut pending, &t);
            }
            Event::SoftBreak | Event::HardBreak => push_text(&mut list, &mut pending, "\n"),
            _ => {}
        }
    }
    flush(&mut pending, &mut blocks, ids);

    debug!(blocks = blocks.len(), "imported markdown");
    blocks
}

/// Text outside any open block starts a paragraph.
fn push_text(list: &mut Option<PendingList>, pending: &mut Option<PendingBlock>, text: &str) {
    if let Some(l) = list.as_mut() {
        l.current.get_or_insert_with(String::new).push_str(text);
        return;
    }
    pending
        .get_or_insert_with(|| PendingBlock {
            kind: BlockKind::Paragraph,
            text: String::new(),
            language: None,
        })
        .text
        .push_str(text);
}

/// Render a document as markdown.
pub fn export_markdown(title: &str, blocks: &[Block]) -> String {
    let mut sections = Vec::with_capacity(blocks.len() + 1);
    if !title.trim().is_empty() {
        sections.push(format!("# {}", title.trim()));
    }

    for block in blocks {
        let text = extract_plain_text(&block.content);
        let section = match block.kind {
            BlockKind::Title | BlockKind::Heading1 => format!("# {text}"),
            BlockKind::Heading2 => format!("## {text}"),
            BlockKind::Heading3 => format!("### {text}"),
            BlockKind::Paragraph | BlockKind::Markdown => text,
            BlockKind::Code => {
                let lang = block.language.as_deref().unwrap_or("");
                format!("```{lang}\n{}\n```", strip_code_escaping(&text))
            }
            BlockKind::BulletList | BlockKind::DashedList | BlockKind::OrderedList => {
                list_item_texts(&block.content)
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match block.kind {
                        BlockKind::OrderedList => format!("{}. {item}", i + 1),
                        BlockKind::DashedList => format!("- {item}"),
                        _ => format!("* {item}"),
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        sections.push(section);
    }

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}
