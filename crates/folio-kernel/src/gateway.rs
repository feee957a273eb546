//! Persistence gateway: in-memory documents to repository calls.

use std::sync::Arc;

use async_trait::async_trait;
use folio_types::{Document, DocumentId, Snapshot, now_millis};
use tracing::{debug, info};

use crate::autosave::SaveSink;
use crate::error::{RepoError, RepoResult};
use crate::repository::{DocumentPatch, DocumentRepository, NewDocument};

/// Thin adapter over a [`DocumentRepository`].
#[derive(Clone)]
pub struct PersistenceGateway {
    repo: Arc<dyn DocumentRepository>,
    owner_id: Option<String>,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repo,
            owner_id: None,
        }
    }

    /// Stamp `owner_id` on documents this gateway creates.
    pub fn with_owner(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn repository(&self) -> &Arc<dyn DocumentRepository> {
        &self.repo
    }

    /// Load `id`, or start a new unsaved document when `id` is `None`.
    ///
    /// The new document has no blocks yet; the session supplies its first
    /// paragraph.
    pub async fn open(&self, id: Option<DocumentId>) -> RepoResult<Document> {
        match id {
            Some(id) => {
                let doc = self.repo.get(id).await?.ok_or(RepoError::NotFound(id))?;
                debug!(document_id = %id, blocks = doc.blocks.len(), "opened document");
                Ok(doc)
            }
            None => {
                let mut doc = Document::new("", Vec::new());
                doc.owner_id = self.owner_id.clone();
                Ok(doc)
            }
        }
    }

    /// Create when `id` is `None`, otherwise update title and blocks.
    pub async fn save(&self, id: Option<DocumentId>, snapshot: &Snapshot) -> RepoResult<Document> {
        match id {
            None => {
                let doc = self
                    .repo
                    .create(NewDocument {
                        title: snapshot.title.clone(),
                        blocks: snapshot.blocks.clone(),
                        owner_id: self.owner_id.clone(),
                    })
                    .await?;
                info!(document_id = ?doc.id, "created document");
                Ok(doc)
            }
            Some(id) => {
                let patch = DocumentPatch {
                    title: Some(snapshot.title.clone()),
                    blocks: Some(snapshot.blocks.clone()),
                    updated_at: now_millis(),
                };
                let doc = self.repo.update(id, patch).await?;
                debug!(document_id = %id, "updated document");
                Ok(doc)
            }
        }
    }

    pub async fn delete(&self, id: DocumentId) -> RepoResult<()> {
        if self.repo.delete(id).await? {
            info!(document_id = %id, "deleted document");
            Ok(())
        } else {
            Err(RepoError::NotFound(id))
        }
    }

    /// Documents for this gateway's owner (all documents when unowned).
    pub async fn list(&self) -> RepoResult<Vec<Document>> {
        self.repo.list(self.owner_id.as_deref()).await
    }
}

/// Saves one document, creating it on first use.
///
/// Saves are serialized, so two debounce cycles racing an unassigned id
/// still produce exactly one create.
pub struct DocumentSaver {
    gateway: PersistenceGateway,
    document_id: tokio::sync::Mutex<Option<DocumentId>>,
    assigned: parking_lot::Mutex<Option<DocumentId>>,
}

impl DocumentSaver {
    pub fn new(gateway: PersistenceGateway, document_id: Option<DocumentId>) -> Self {
        Self {
            gateway,
            document_id: tokio::sync::Mutex::new(document_id),
            assigned: parking_lot::Mutex::new(document_id),
        }
    }

    /// The id once the document has been stored.
    pub fn document_id(&self) -> Option<DocumentId> {
        *self.assigned.lock()
    }
}

#[async_trait]
impl SaveSink for DocumentSaver {
    async fn save(&self, snapshot: Snapshot) -> RepoResult<DocumentId> {
        let mut current = self.document_id.lock().await;
        let doc = self.gateway.save(*current, &snapshot).await?;
        let id = doc
            .id
            .ok_or_else(|| RepoError::storage("repository returned a document without an id"))?;
        *current = Some(id);
        *self.assigned.lock() = Some(id);
        Ok(id)
    }
}
