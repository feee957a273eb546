//! Block id to focus handle registry.
//!
//! Handles are registered when a block's inline editor mounts and removed
//! when it unmounts. Lookups for ids that are not mounted return `None`.

use std::collections::HashMap;

use folio_types::BlockId;
use tracing::trace;

#[derive(Debug)]
pub struct FocusRegistry<H> {
    handles: HashMap<BlockId, H>,
}

impl<H> Default for FocusRegistry<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }
}

impl<H> FocusRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mounted block. Replaces any previous handle for `id`.
    pub fn register(&mut self, id: BlockId, handle: H) -> Option<H> {
        trace!(block_id = %id, "focus handle registered");
        self.handles.insert(id, handle)
    }

    pub fn unregister(&mut self, id: &BlockId) -> Option<H> {
        trace!(block_id = %id, "focus handle unregistered");
        self.handles.remove(id)
    }

    pub fn get(&self, id: &BlockId) -> Option<&H> {
        self.handles.get(id)
    }

    pub fn get_mut(&mut self, id: &BlockId) -> Option<&mut H> {
        self.handles.get_mut(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop handles whose ids are not in `live`.
    pub fn retain_live<'a>(&mut self, live: impl IntoIterator<Item = &'a BlockId>) {
        let live: std::collections::HashSet<&BlockId> = live.into_iter().collect();
        self.handles.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_unregister() {
        let mut reg = FocusRegistry::new();
        assert!(reg.register(BlockId::new("1"), "one").is_none());
        assert_eq!(reg.register(BlockId::new("1"), "uno"), Some("one"));
        assert_eq!(reg.get(&BlockId::new("1")), Some(&"uno"));
        assert_eq!(reg.unregister(&BlockId::new("1")), Some("uno"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_retain_live() {
        let mut reg = FocusRegistry::new();
        reg.register(BlockId::new("a"), 1);
        reg.register(BlockId::new("b"), 2);
        let live = [BlockId::new("b")];
        reg.retain_live(live.iter());
        assert!(!reg.contains(&BlockId::new("a")));
        assert!(reg.contains(&BlockId::new("b")));
        assert_eq!(reg.len(), 1);
    }
}
