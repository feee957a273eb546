//! The document repository boundary.
//!
//! Repositories store whole documents. Block content goes in and comes back
//! out verbatim; nothing here looks inside a block.

use std::collections::BTreeMap;

use async_trait::async_trait;
use folio_types::{Block, Document, DocumentId, now_millis};
use parking_lot::Mutex;
use tracing::trace;

use crate::error::{RepoError, RepoResult};

/// Fields for a new document.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub title: String,
    pub blocks: Vec<Block>,
    pub owner_id: Option<String>,
}

/// Partial update. `None` fields are left as stored.
#[derive(Debug, Clone)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub blocks: Option<Vec<Block>>,
    pub updated_at: u64,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self {
            title: None,
            blocks: None,
            updated_at: now_millis(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = Some(blocks);
        self
    }
}

impl Default for DocumentPatch {
    fn default() -> Self {
        Self::new()
    }
}

/// CRUD over whole documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Store a new document and assign its id.
    async fn create(&self, doc: NewDocument) -> RepoResult<Document>;

    /// Apply a patch. Missing ids are [`RepoError::NotFound`].
    async fn update(&self, id: DocumentId, patch: DocumentPatch) -> RepoResult<Document>;

    async fn get(&self, id: DocumentId) -> RepoResult<Option<Document>>;

    /// Documents, most recently updated first, optionally for one owner.
    async fn list(&self, owner_id: Option<&str>) -> RepoResult<Vec<Document>>;

    /// Returns whether anything was deleted.
    async fn delete(&self, id: DocumentId) -> RepoResult<bool>;
}

/// In-process repository. Ids count up from 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    docs: BTreeMap<DocumentId, Document>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn create(&self, doc: NewDocument) -> RepoResult<Document> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = DocumentId::new(inner.next_id);
        let mut stored = Document::new(doc.title, doc.blocks);
        stored.id = Some(id);
        stored.owner_id = doc.owner_id;
        inner.docs.insert(id, stored.clone());
        trace!(document_id = %id, "memory create");
        Ok(stored)
    }

    async fn update(&self, id: DocumentId, patch: DocumentPatch) -> RepoResult<Document> {
        let mut inner = self.inner.lock();
        let doc = inner.docs.get_mut(&id).ok_or(RepoError::NotFound(id))?;
        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(blocks) = patch.blocks {
            doc.blocks = blocks;
        }
        doc.updated_at = patch.updated_at;
        trace!(document_id = %id, "memory update");
        Ok(doc.clone())
    }

    async fn get(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        Ok(self.inner.lock().docs.get(&id).cloned())
    }

    async fn list(&self, owner_id: Option<&str>) -> RepoResult<Vec<Document>> {
        let inner = self.inner.lock();
        let mut docs: Vec<Document> = inner
            .docs
            .values()
            .filter(|d| owner_id.is_none() || d.owner_id.as_deref() == owner_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(docs)
    }

    async fn delete(&self, id: DocumentId) -> RepoResult<bool> {
        Ok(self.inner.lock().docs.remove(&id).is_some())
    }
}
