//! SQLite document storage.
//!
//! One row per document. Blocks are stored as a JSON array in `content`,
//! exactly as the editor produced them.

use std::path::Path;

use async_trait::async_trait;
use folio_types::{Block, Document, DocumentId, now_millis};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::error::{RepoError, RepoResult};
use crate::repository::{DocumentPatch, DocumentRepository, NewDocument};

const SCHEMA: &str = r#"
-- AUTOINCREMENT keeps deleted ids from coming back
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '[]',
    owner_id TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id, updated_at);
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, content, owner_id, created_at, updated_at FROM documents";

/// Document repository backed by a single SQLite connection.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository").finish_non_exhaustive()
    }
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<(Document, String)> {
    let id: i64 = row.get(0)?;
    let created_at: i64 = row.get(4)?;
    let updated_at: i64 = row.get(5)?;
    let doc = Document {
        id: Some(DocumentId::new(id)),
        title: row.get(1)?,
        blocks: Vec::new(),
        owner_id: row.get(3)?,
        created_at: from_column(created_at),
        updated_at: from_column(updated_at),
    };
    Ok((doc, row.get(2)?))
}

/// Timestamps are stored as signed integers; rows written by other tools can
/// hold values below zero, which read back as the epoch.
fn from_column(millis: i64) -> u64 {
    u64::try_from(millis).unwrap_or(0)
}

fn to_column(millis: u64) -> i64 {
    i64::try_from(millis).unwrap_or(i64::MAX)
}

fn with_blocks((mut doc, content): (Document, String)) -> RepoResult<Document> {
    doc.blocks = serde_json::from_str::<Vec<Block>>(&content)?;
    Ok(doc)
}

impl SqliteRepository {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> RepoResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RepoError::storage(format!("{}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "opened document database");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> RepoResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn create_document(&self, doc: &NewDocument) -> RepoResult<Document> {
        let content = serde_json::to_string(&doc.blocks)?;
        let now = now_millis();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO documents (title, content, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![doc.title, content, doc.owner_id, to_column(now)],
        )?;
        let id = DocumentId::new(conn.last_insert_rowid());
        Ok(Document {
            id: Some(id),
            title: doc.title.clone(),
            blocks: doc.blocks.clone(),
            owner_id: doc.owner_id.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        let row = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id.get()])?;
            match rows.next()? {
                Some(row) => Some(row_to_document(row)?),
                None => None,
            }
        };
        row.map(with_blocks).transpose()
    }

    pub fn update_document(&self, id: DocumentId, patch: &DocumentPatch) -> RepoResult<Document> {
        let content = patch.blocks.as_ref().map(serde_json::to_string).transpose()?;
        let changed = self.conn.lock().execute(
            "UPDATE documents
             SET title = COALESCE(?1, title),
                 content = COALESCE(?2, content),
                 updated_at = ?3
             WHERE id = ?4",
            params![patch.title, content, to_column(patch.updated_at), id.get()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        self.get_document(id)?.ok_or(RepoError::NotFound(id))
    }

    pub fn list_documents(&self, owner_id: Option<&str>) -> RepoResult<Vec<Document>> {
        let rows = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE (?1 IS NULL OR owner_id = ?1)
                 ORDER BY updated_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![owner_id], row_to_document)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(with_blocks).collect()
    }

    pub fn delete_document(&self, id: DocumentId) -> RepoResult<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM documents WHERE id = ?1", params![id.get()])?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl DocumentRepository for SqliteRepository {
    async fn create(&self, doc: NewDocument) -> RepoResult<Document> {
        self.create_document(&doc)
    }

    async fn update(&self, id: DocumentId, patch: DocumentPatch) -> RepoResult<Document> {
        self.update_document(id, &patch)
    }

    async fn get(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        self.get_document(id)
    }

    async fn list(&self, owner_id: Option<&str>) -> RepoResult<Vec<Document>> {
        self.list_documents(owner_id)
    }

    async fn delete(&self, id: DocumentId) -> RepoResult<bool> {
        self.delete_document(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::{BlockContent, BlockId, BlockKind, RichNode};

    fn sample_blocks() -> Vec<Block> {
        let rich = RichNode::element(
            "doc",
            vec![RichNode::element("heading", vec![RichNode::text("Intro")]).with_attr("level", 1)],
        );
        vec![
            Block::new(BlockId::new("1"), BlockKind::Heading1).with_content(BlockContent::Rich(rich)),
            Block::new(BlockId::new("2"), BlockKind::Code)
                .with_language("rust")
                .with_content("fn main() {}"),
        ]
    }

    #[test]
    fn test_document_crud() {
        let db = SqliteRepository::in_memory().unwrap();

        let doc = db
            .create_document(&NewDocument {
                title: "Notes".into(),
                blocks: sample_blocks(),
                owner_id: None,
            })
            .unwrap();
        let id = doc.id.unwrap();

        let fetched = db.get_document(id).unwrap().unwrap();
        assert_eq!(fetched.title, "Notes");
        assert_eq!(fetched.blocks, sample_blocks());

        let patch = DocumentPatch {
            title: None,
            blocks: Some(vec![]),
            updated_at: fetched.updated_at + 10,
        };
        let updated = db.update_document(id, &patch).unwrap();
        assert_eq!(updated.title, "Notes");
        assert!(updated.blocks.is_empty());
        assert_eq!(updated.updated_at, fetched.updated_at + 10);

        assert!(db.delete_document(id).unwrap());
        assert!(db.get_document(id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let db = SqliteRepository::in_memory().unwrap();
        let err = db
            .update_document(DocumentId::new(5), &DocumentPatch::new().title("x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_filters_owner_and_orders_recent_first() {
        let db = SqliteRepository::in_memory().unwrap();
        let mut ids = Vec::new();
        for (title, owner) in [("a", "ana"), ("b", "ben"), ("c", "ana")] {
            let doc = db
                .create_document(&NewDocument {
                    title: title.into(),
                    blocks: vec![],
                    owner_id: Some(owner.into()),
                })
                .unwrap();
            ids.push(doc.id.unwrap());
        }
        db.update_document(
            ids[0],
            &DocumentPatch {
                title: None,
                blocks: None,
                updated_at: now_millis() + 60_000,
            },
        )
        .unwrap();

        let ana: Vec<_> = db
            .list_documents(Some("ana"))
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(ana, vec!["a", "c"]);
        assert_eq!(db.list_documents(None).unwrap().len(), 3);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let db = SqliteRepository::in_memory().unwrap();
        let first = db.create_document(&NewDocument::default()).unwrap().id.unwrap();
        db.delete_document(first).unwrap();
        let second = db.create_document(&NewDocument::default()).unwrap().id.unwrap();
        assert!(second.get() > first.get());
    }

    #[test]
    fn test_on_disk_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("docs.db");
        let id = {
            let db = SqliteRepository::open(&path).unwrap();
            db.create_document(&NewDocument {
                title: "Persisted".into(),
                blocks: sample_blocks(),
                owner_id: None,
            })
            .unwrap()
            .id
            .unwrap()
        };
        let db = SqliteRepository::open(&path).unwrap();
        let doc = db.get_document(id).unwrap().unwrap();
        assert_eq!(doc.title, "Persisted");
        assert_eq!(doc.blocks.len(), 2);
    }

    #[test]
    fn test_negative_timestamps_read_as_epoch() {
        let db = SqliteRepository::in_memory().unwrap();
        let id = db.create_document(&NewDocument::default()).unwrap().id.unwrap();
        db.conn
            .lock()
            .execute(
                "UPDATE documents SET created_at = -5, updated_at = -1 WHERE id = ?1",
                params![id.get()],
            )
            .unwrap();

        let doc = db.get_document(id).unwrap().unwrap();
        assert_eq!(doc.created_at, 0);
        assert_eq!(doc.updated_at, 0);
    }

    #[test]
    fn test_oversized_timestamp_is_clamped() {
        let db = SqliteRepository::in_memory().unwrap();
        let id = db.create_document(&NewDocument::default()).unwrap().id.unwrap();
        let patch = DocumentPatch {
            title: None,
            blocks: None,
            updated_at: u64::MAX,
        };
        let doc = db.update_document(id, &patch).unwrap();
        assert_eq!(doc.updated_at, i64::MAX as u64);
    }
}
