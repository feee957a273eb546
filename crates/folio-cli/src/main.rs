//! Folio command-line tool.
//!
//! Works directly against the SQLite document store.
//!
//! Usage:
//!   folio new --title "Meeting notes"
//!   folio list
//!   folio show 3 --markdown
//!   folio apply 3 edits.jsonl
//!   folio import notes.md
//!   folio delete 3
//!
//! `apply` reads one JSON intent per line, e.g.
//! `{"intent":"split_after","block_id":"…","type":"paragraph"}`.
//! Blank lines and lines starting with `#` are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use folio_editor::{
    BlockListEditor, Intent, UuidIds, export_markdown, extract_plain_text, import_markdown,
};
use folio_kernel::{EditSession, EditorConfig, PersistenceGateway, SqliteRepository};
use folio_types::{DocumentId, Snapshot};

/// Block-structured documents from the terminal.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Create, edit and export Folio documents")]
struct Args {
    /// SQLite database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (default: ~/.config/folio/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty document
    New {
        #[arg(long, default_value = "")]
        title: String,
    },
    /// List documents, most recently updated first
    List {
        /// Only documents owned by this id
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print a document
    Show {
        id: i64,
        /// Render as markdown
        #[arg(long, conflicts_with = "json")]
        markdown: bool,
        /// Dump the stored JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a file of JSON intents to a document
    Apply { id: i64, intents: PathBuf },
    /// Create a document from a markdown file
    Import {
        file: PathBuf,
        /// Defaults to the file name
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a document
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path),
        None => EditorConfig::load_default(),
    }
    .context("loading config")?;
    let db_path = args.db.clone().unwrap_or_else(|| config.database_path());
    let repo = SqliteRepository::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    let gateway =
        PersistenceGateway::new(Arc::new(repo)).with_owner(config.default_owner.clone());

    match args.command {
        Command::New { title } => cmd_new(&gateway, title).await,
        Command::List { owner } => cmd_list(&gateway, owner.as_deref()).await,
        Command::Show { id, markdown, json } => {
            cmd_show(&gateway, DocumentId::new(id), markdown, json).await
        }
        Command::Apply { id, intents } => {
            cmd_apply(gateway, &config, DocumentId::new(id), &intents).await
        }
        Command::Import { file, title } => cmd_import(&gateway, &file, title).await,
        Command::Delete { id } => {
            gateway.delete(DocumentId::new(id)).await?;
            println!("deleted {id}");
            Ok(())
        }
    }
}

async fn cmd_new(gateway: &PersistenceGateway, title: String) -> Result<()> {
    let blocks = BlockListEditor::new().ensure_non_empty(Vec::new());
    let doc = gateway.save(None, &Snapshot::new(title, blocks)).await?;
    let id = doc.id.context("repository assigned no id")?;
    println!("{id}");
    Ok(())
}

async fn cmd_list(gateway: &PersistenceGateway, owner: Option<&str>) -> Result<()> {
    let docs = match owner {
        Some(owner) => gateway.repository().list(Some(owner)).await?,
        None => gateway.list().await?,
    };
    for doc in docs {
        let id = doc.id.map(|id| id.to_string()).unwrap_or_default();
        let title = if doc.title.is_empty() { "(untitled)" } else { doc.title.as_str() };
        println!("{id}\t{title}\t{} blocks", doc.blocks.len());
    }
    Ok(())
}

async fn cmd_show(
    gateway: &PersistenceGateway,
    id: DocumentId,
    markdown: bool,
    json: bool,
) -> Result<()> {
    let doc = gateway.open(Some(id)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else if markdown {
        print!("{}", export_markdown(&doc.title, &doc.blocks));
    } else {
        println!("{}", doc.title);
        for block in &doc.blocks {
            println!(
                "  {} [{}] {}",
                block.id.short(),
                block.kind.display_name(),
                extract_plain_text(&block.content).replace('\n', " / ")
            );
        }
    }
    Ok(())
}

async fn cmd_apply(
    gateway: PersistenceGateway,
    config: &EditorConfig,
    id: DocumentId,
    path: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let mut intents = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let intent: Intent = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: bad intent", path.display(), n + 1))?;
        intents.push(intent);
    }

    let mut session = EditSession::open(gateway, Some(id), config.autosave()).await?;
    let mut changed = 0;
    for intent in intents {
        let name = intent.name();
        if session.dispatch(intent).changed {
            changed += 1;
        } else {
            tracing::info!(intent = name, "intent had no effect");
        }
    }
    session.flush().await?;
    let status = session.autosave_status();
    session.close().await?;

    if status.saves_failed > 0 {
        bail!("saving document {id} failed");
    }
    println!("applied {changed} intents to {id}");
    Ok(())
}

async fn cmd_import(
    gateway: &PersistenceGateway,
    file: &Path,
    title: Option<String>,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let blocks = BlockListEditor::new().ensure_non_empty(import_markdown(&text, &mut UuidIds));
    let doc = gateway.save(None, &Snapshot::new(title, blocks)).await?;
    let id = doc.id.context("repository assigned no id")?;
    println!("{id}");
    Ok(())
}
