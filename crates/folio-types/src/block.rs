//! Blocks: the smallest independently typed, editable unit of a document.
//!
//! A block's `content` is whatever the inline editor handed us: either a bare
//! string (older payloads, CLI input) or a structured node tree in the shape
//! the rich-text surface emits (`{"type": "doc", "content": [...]}`). Inline
//! marks ride along untouched; nothing in Folio interprets them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::ids::BlockId;

/// What a block renders as.
///
/// Serialized camelCase (`bulletList`, `heading1`). Deserialization is
/// lossy: names Folio does not know (legacy `toggle`, `callout`, ...) load
/// as [`BlockKind::Paragraph`] so older and newer payloads always open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumString)]
#[serde(rename_all = "camelCase", from = "String")]
#[strum(ascii_case_insensitive)]
pub enum BlockKind {
    /// Document-level title styling.
    #[strum(serialize = "title")]
    Title,
    #[strum(serialize = "heading1", serialize = "h1")]
    Heading1,
    #[strum(serialize = "heading2", serialize = "h2", serialize = "heading")]
    Heading2,
    #[strum(serialize = "heading3", serialize = "h3", serialize = "subheading")]
    Heading3,
    /// Body text, and the fallback for anything unrecognized.
    #[default]
    #[strum(serialize = "paragraph", serialize = "p", serialize = "text", serialize = "body")]
    Paragraph,
    /// Monospaced code; the only kind that carries a `language`.
    #[strum(
        serialize = "code",
        serialize = "code_block",
        serialize = "codeBlock",
        serialize = "monostyled"
    )]
    Code,
    #[strum(serialize = "markdown", serialize = "md")]
    Markdown,
    #[strum(
        serialize = "bulletList",
        serialize = "bullet_list",
        serialize = "bulleted_list",
        serialize = "bulletedList"
    )]
    BulletList,
    #[strum(
        serialize = "orderedList",
        serialize = "ordered_list",
        serialize = "numbered_list",
        serialize = "numberedList"
    )]
    OrderedList,
    #[strum(serialize = "dashedList", serialize = "dashed_list")]
    DashedList,
}

impl BlockKind {
    /// Every kind, in menu order.
    pub const ALL: [BlockKind; 10] = [
        BlockKind::Title,
        BlockKind::Heading1,
        BlockKind::Heading2,
        BlockKind::Heading3,
        BlockKind::Paragraph,
        BlockKind::Code,
        BlockKind::Markdown,
        BlockKind::BulletList,
        BlockKind::OrderedList,
        BlockKind::DashedList,
    ];

    /// Parse from string (case-insensitive, with aliases).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s.trim()).ok()
    }

    /// Parse, falling back to [`BlockKind::Paragraph`].
    pub fn from_str_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }

    /// Convert to the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Title => "title",
            BlockKind::Heading1 => "heading1",
            BlockKind::Heading2 => "heading2",
            BlockKind::Heading3 => "heading3",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Code => "code",
            BlockKind::Markdown => "markdown",
            BlockKind::BulletList => "bulletList",
            BlockKind::OrderedList => "orderedList",
            BlockKind::DashedList => "dashedList",
        }
    }

    /// Human-facing name for format menus.
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockKind::Title => "Title",
            BlockKind::Heading1 => "Large Heading",
            BlockKind::Heading2 => "Heading",
            BlockKind::Heading3 => "Subheading",
            BlockKind::Paragraph => "Body",
            BlockKind::Code => "Monostyled",
            BlockKind::Markdown => "Markdown",
            BlockKind::BulletList => "Bulleted List",
            BlockKind::OrderedList => "Numbered List",
            BlockKind::DashedList => "Dashed List",
        }
    }

    /// Style class a renderer attaches to the block.
    pub fn style_class(&self) -> &'static str {
        match self {
            BlockKind::Title => "block-title",
            BlockKind::Heading1 => "block-heading-1",
            BlockKind::Heading2 => "block-heading-2",
            BlockKind::Heading3 => "block-heading-3",
            BlockKind::Paragraph => "block-paragraph",
            BlockKind::Code => "block-code",
            BlockKind::Markdown => "block-markdown",
            BlockKind::BulletList => "block-list block-list-bullet",
            BlockKind::OrderedList => "block-list block-list-ordered",
            BlockKind::DashedList => "block-list block-list-dashed",
        }
    }

    /// Bullet, ordered and dashed lists.
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            BlockKind::BulletList | BlockKind::OrderedList | BlockKind::DashedList
        )
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Heading level 1-3, or `None` for everything else.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, BlockKind::Code)
    }
}

impl From<String> for BlockKind {
    fn from(s: String) -> Self {
        Self::from_str_lossy(&s)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the inline editor's structured content tree.
///
/// `type` names the node (`doc`, `paragraph`, `heading`, `codeBlock`,
/// `bulletList`, `listItem`, `text`, `hardBreak`, ...). Only `text` nodes
/// carry `text`. `marks` are opaque.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RichNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RichNode>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attrs: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<serde_json::Value>,
}

impl RichNode {
    /// An element node with children.
    pub fn element(kind: impl Into<String>, content: Vec<RichNode>) -> Self {
        Self {
            kind: kind.into(),
            content,
            ..Default::default()
        }
    }

    /// An unmarked text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }

    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }
}

/// A block's content payload.
///
/// Untagged on the wire: a JSON string is [`BlockContent::Text`], a JSON
/// object is [`BlockContent::Rich`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    Text(String),
    Rich(RichNode),
}

impl Default for BlockContent {
    fn default() -> Self {
        BlockContent::Text(String::new())
    }
}

impl From<&str> for BlockContent {
    fn from(s: &str) -> Self {
        BlockContent::Text(s.to_string())
    }
}

impl From<String> for BlockContent {
    fn from(s: String) -> Self {
        BlockContent::Text(s)
    }
}

impl From<RichNode> for BlockContent {
    fn from(node: RichNode) -> Self {
        BlockContent::Rich(node)
    }
}

/// One block of a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: BlockContent,
    /// Only meaningful for [`BlockKind::Code`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Block {
    /// A block with empty string content.
    pub fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            content: BlockContent::default(),
            language: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<BlockContent>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the language; ignored unless this is a code block.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        if self.kind.is_code() {
            self.language = Some(language.into());
        }
        self
    }
}

/// Count whitespace-separated words. Blank text counts as zero.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
