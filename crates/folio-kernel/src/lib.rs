//! # folio-kernel
//!
//! Edit sessions and persistence for Folio.
//!
//! An [`EditSession`] is the runtime for one open document:
//! - Owns the title and the block sequence
//! - Applies intents through [`folio_editor::BlockListEditor`]
//! - Routes focus to mounted [`folio_editor::InlineContentEditor`]s
//! - Feeds every committed snapshot to the autosave coordinator
//!
//! Saves land in a [`DocumentRepository`] through the [`PersistenceGateway`];
//! [`SqliteRepository`] is the on-disk backend, [`MemoryRepository`] the
//! test one.

pub mod autosave;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod gateway;
pub mod repository;
pub mod session;

pub use autosave::{
    AutosaveConfig, AutosaveError, AutosaveHandle, AutosaveStatus, SaveSink, spawn_autosave,
};
pub use config::{ConfigError, EditorConfig};
pub use db::SqliteRepository;
pub use error::{RepoError, RepoResult, SessionError};
pub use events::SessionEvent;
pub use gateway::{DocumentSaver, PersistenceGateway};
pub use repository::{DocumentPatch, DocumentRepository, MemoryRepository, NewDocument};
pub use session::{Dispatched, EditSession, EditorHandle};
