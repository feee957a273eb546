//! Typed identifiers for blocks and documents.
//!
//! Block ids are opaque strings on the wire. Freshly minted ids are UUIDv7
//! text, but ids loaded from stored documents may be anything (older
//! documents used small integers), so the type never parses its contents.
//! Document ids are the repository's integer keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A block identifier, unique within its document and never reused.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a new time-ordered id (UUIDv7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log lines only.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Numeric value when the id is a plain integer.
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.short())
    }
}

/// A document identifier assigned by the repository on first save.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Parse a decimal id as typed on a command line.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse().ok().map(Self)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = BlockId::generate();
        let b = BlockId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn test_short_on_small_ids() {
        assert_eq!(BlockId::new("7").short(), "7");
        assert_eq!(BlockId::new("7").as_number(), Some(7));
        assert_eq!(BlockId::new("abc").as_number(), None);
    }

    #[test]
    fn test_block_id_is_transparent_on_the_wire() {
        let json = serde_json::to_string(&BlockId::new("42")).unwrap();
        assert_eq!(json, "\"42\"");
        let back: BlockId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BlockId::new("42"));
    }

    #[test]
    fn test_document_id_parse() {
        assert_eq!(DocumentId::parse(" 12 "), Some(DocumentId::new(12)));
        assert_eq!(DocumentId::parse("twelve"), None);
    }
}
