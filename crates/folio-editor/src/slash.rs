//! Slash command vocabulary.
//!
//! A block whose whole text is a trigger (after trimming and lowercasing)
//! converts to the mapped kind. Prefixes never match: `/h2x` stays text.

use folio_types::BlockKind;

/// One entry in the slash command menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlashCommand {
    pub trigger: &'static str,
    pub target: BlockKind,
    pub label: &'static str,
}

pub const SLASH_COMMANDS: &[SlashCommand] = &[
    SlashCommand { trigger: "/title", target: BlockKind::Title, label: "Title" },
    SlashCommand { trigger: "/h1", target: BlockKind::Heading1, label: "Large Heading" },
    SlashCommand { trigger: "/heading", target: BlockKind::Heading2, label: "Heading" },
    SlashCommand { trigger: "/h2", target: BlockKind::Heading2, label: "Heading" },
    SlashCommand { trigger: "/subheading", target: BlockKind::Heading3, label: "Subheading" },
    SlashCommand { trigger: "/h3", target: BlockKind::Heading3, label: "Subheading" },
    SlashCommand { trigger: "/body", target: BlockKind::Paragraph, label: "Body" },
    SlashCommand { trigger: "/code", target: BlockKind::Code, label: "Monostyled" },
    SlashCommand { trigger: "/monostyled", target: BlockKind::Code, label: "Monostyled" },
    SlashCommand { trigger: "/bulletedlist", target: BlockKind::BulletList, label: "Bulleted List" },
    SlashCommand { trigger: "/numberedlist", target: BlockKind::OrderedList, label: "Numbered List" },
];

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Target kind for an exact trigger match.
pub fn parse_slash_command(text: &str) -> Option<BlockKind> {
    let wanted = normalize(text);
    SLASH_COMMANDS
        .iter()
        .find(|cmd| cmd.trigger == wanted)
        .map(|cmd| cmd.target)
}

/// True when `block_text` is exactly `command` under slash normalization.
pub fn matches_command(block_text: &str, command: &str) -> bool {
    normalize(block_text) == normalize(command)
}

/// Menu entries whose trigger starts with what has been typed so far.
pub fn suggestions(partial: &str) -> Vec<&'static SlashCommand> {
    let wanted = normalize(partial);
    if !wanted.starts_with('/') {
        return Vec::new();
    }
    SLASH_COMMANDS
        .iter()
        .filter(|cmd| cmd.trigger.starts_with(&wanted))
        .collect()
}
