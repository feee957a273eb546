//! Edit sessions: one open document, one mutator.
//!
//! An [`EditSession`] owns the title, the block sequence, the mounted inline
//! editors and the autosave handle. Every mutating method takes `&mut self`,
//! so an intent is applied, committed and focus is moved before the next
//! one can start; there is no separate busy flag to get out of sync.

use std::collections::HashMap;
use std::sync::Arc;

use folio_editor::content::is_empty;
use folio_editor::{
    BlockListEditor, BlockPatch, DragEnd, FocusRegistry, FocusTarget, IdSource,
    InlineContentEditor, InlineEvent, Intent, Key, KeyRoute, Modifiers, UuidIds,
    document_word_count, route_key, route_title_enter,
};
use folio_types::{Block, BlockContent, BlockId, DocumentId, Snapshot};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::autosave::{AutosaveConfig, AutosaveError, AutosaveHandle, AutosaveStatus, spawn_autosave};
use crate::error::SessionError;
use crate::events::{EVENT_CAPACITY, SessionEvent};
use crate::gateway::{DocumentSaver, PersistenceGateway};

/// A mounted inline editor.
pub type EditorHandle = Box<dyn InlineContentEditor + Send>;

/// What one dispatched intent did.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub changed: bool,
    pub focus: Option<FocusTarget>,
}

pub struct EditSession<I: IdSource = UuidIds> {
    title: String,
    blocks: Vec<Block>,
    editor: BlockListEditor<I>,
    mounted: FocusRegistry<EditorHandle>,
    last_focused: Option<BlockId>,
    saver: Arc<DocumentSaver>,
    autosave: AutosaveHandle,
    events: broadcast::Sender<SessionEvent>,
}

impl EditSession<UuidIds> {
    /// Open `id`, or a new empty document when `id` is `None`.
    pub async fn open(
        gateway: PersistenceGateway,
        id: Option<DocumentId>,
        config: AutosaveConfig,
    ) -> Result<Self, SessionError> {
        Self::open_with_ids(gateway, id, config, UuidIds).await
    }
}

impl<I: IdSource> EditSession<I> {
    pub async fn open_with_ids(
        gateway: PersistenceGateway,
        id: Option<DocumentId>,
        config: AutosaveConfig,
        ids: I,
    ) -> Result<Self, SessionError> {
        let doc = gateway.open(id).await?;
        let mut editor = BlockListEditor::with_ids(ids);
        let blocks = editor.ensure_non_empty(doc.blocks);
        let title = doc.title;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let saver = Arc::new(DocumentSaver::new(gateway, doc.id));
        let baseline = Snapshot::new(title.clone(), blocks.clone());
        let autosave = spawn_autosave(config, saver.clone(), baseline, events.clone());

        debug!(document_id = ?doc.id, blocks = blocks.len(), "edit session opened");
        Ok(Self {
            title,
            blocks,
            editor,
            mounted: FocusRegistry::new(),
            last_focused: None,
            saver,
            autosave,
            events,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Assigned once the first save lands.
    pub fn document_id(&self) -> Option<DocumentId> {
        self.saver.document_id()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.title.clone(), self.blocks.clone())
    }

    pub fn last_focused_block(&self) -> Option<&BlockId> {
        self.last_focused.as_ref()
    }

    pub fn word_count(&self) -> usize {
        document_word_count(&self.blocks)
    }

    pub fn autosave_status(&self) -> AutosaveStatus {
        self.autosave.status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ── Mounting ────────────────────────────────────────────────────────

    /// Register the inline editor rendering `id`.
    pub fn mount(&mut self, id: BlockId, handle: EditorHandle) {
        self.mounted.register(id, handle);
    }

    pub fn unmount(&mut self, id: &BlockId) -> Option<EditorHandle> {
        self.mounted.unregister(id)
    }

    pub fn is_mounted(&self, id: &BlockId) -> bool {
        self.mounted.contains(id)
    }

    // ── Editing ─────────────────────────────────────────────────────────

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.observe();
        }
    }

    /// Apply an intent, commit the result, then move focus.
    pub fn dispatch(&mut self, intent: Intent) -> Dispatched {
        self.commit(intent, true)
    }

    /// React to an event from the inline editor mounted for `block_id`.
    pub fn handle_event(&mut self, block_id: &BlockId, event: InlineEvent) -> Option<FocusTarget> {
        match event {
            InlineEvent::TextChanged => self.text_changed(block_id),
            InlineEvent::Focus => {
                self.last_focused = Some(block_id.clone());
                None
            }
            InlineEvent::Blur => None,
            InlineEvent::Key { key, modifiers } => self.key(block_id, &key, modifiers),
        }
    }

    /// Key pressed in the title field.
    pub fn handle_title_key(&mut self, key: &Key, modifiers: Modifiers) -> Option<FocusTarget> {
        if *key != Key::Enter || modifiers.shift {
            return None;
        }
        let id = route_title_enter(&self.blocks)?;
        let target = FocusTarget::block_start(id);
        self.move_focus(&target);
        Some(target)
    }

    pub fn handle_drag_end(&mut self, drop: DragEnd) -> bool {
        match drop.into_intent() {
            Some(intent) => self.commit(intent, false).changed,
            None => false,
        }
    }

    /// Paste into `block_id`. Multi-line text becomes blocks; a single line
    /// goes to the inline editor at its caret.
    pub fn paste(&mut self, block_id: &BlockId, text: &str) -> Option<FocusTarget> {
        let result = self.commit(
            Intent::PasteText {
                block_id: block_id.clone(),
                text: text.to_string(),
            },
            true,
        );
        if !result.changed {
            if let Some(handle) = self.mounted.get_mut(block_id) {
                handle.insert_plain_text(text);
            }
        }
        result.focus
    }

    /// Save anything pending now.
    pub async fn flush(&self) -> Result<(), AutosaveError> {
        self.autosave.flush().await
    }

    /// Tear down: the pending save (if any) is cancelled, in-flight saves
    /// finish.
    pub async fn close(self) -> Result<(), AutosaveError> {
        debug!(document_id = ?self.document_id(), "edit session closing");
        self.autosave.close().await
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn text_changed(&mut self, block_id: &BlockId) -> Option<FocusTarget> {
        let Some(handle) = self.mounted.get(block_id) else {
            trace!(block_id = %block_id, "text change from unmounted block");
            return None;
        };
        let content = handle.structured_content();
        self.commit(
            Intent::UpdateBlockContent {
                block_id: block_id.clone(),
                patch: BlockPatch::content(content),
            },
            false,
        )
        .focus
    }

    fn key(&mut self, block_id: &BlockId, key: &Key, modifiers: Modifiers) -> Option<FocusTarget> {
        let empty = match self.mounted.get(block_id) {
            Some(handle) => handle.is_empty(),
            None => self.block(block_id).is_some_and(|b| is_empty(&b.content)),
        };
        match route_key(&self.blocks, block_id, key, modifiers, empty) {
            KeyRoute::Intent(intent) => self.commit(intent, true).focus,
            KeyRoute::FocusTitle => Some(FocusTarget::Title),
            KeyRoute::Inline => None,
        }
    }

    fn commit(&mut self, intent: Intent, push_to_mounted: bool) -> Dispatched {
        let name = intent.name();
        let applied = self.editor.apply(&self.blocks, intent);
        if !applied.changed {
            trace!(intent = name, "intent was a no-op");
            if let Some(target) = &applied.focus {
                self.move_focus(target);
            }
            return Dispatched {
                changed: false,
                focus: applied.focus,
            };
        }

        let before = std::mem::replace(&mut self.blocks, applied.blocks);
        if push_to_mounted {
            self.push_content(&before);
        }
        self.mounted.retain_live(self.blocks.iter().map(|b| &b.id));
        self.observe();

        if let Some(target) = &applied.focus {
            self.move_focus(target);
        }
        Dispatched {
            changed: true,
            focus: applied.focus,
        }
    }

    /// Hand rewritten content to mounted editors.
    fn push_content(&mut self, before: &[Block]) {
        let previous: HashMap<&BlockId, &BlockContent> =
            before.iter().map(|b| (&b.id, &b.content)).collect();
        for block in &self.blocks {
            let rewritten = previous
                .get(&block.id)
                .is_some_and(|old| **old != block.content);
            if rewritten {
                if let Some(handle) = self.mounted.get_mut(&block.id) {
                    handle.set_content(&block.content);
                }
            }
        }
    }

    fn move_focus(&mut self, target: &FocusTarget) {
        if let FocusTarget::Block { id, caret } = target {
            if let Some(handle) = self.mounted.get_mut(id) {
                handle.focus(*caret);
            }
            self.last_focused = Some(id.clone());
        }
    }

    fn observe(&self) {
        if let Err(e) = self.autosave.observe(self.snapshot()) {
            warn!("autosave unavailable: {e}");
        }
    }
}

impl<I: IdSource> std::fmt::Debug for EditSession<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("document_id", &self.document_id())
            .field("title", &self.title)
            .field("blocks", &self.blocks.len())
            .field("mounted", &self.mounted.len())
            .finish_non_exhaustive()
    }
}
