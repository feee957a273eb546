//! Autosave coordinator: a trailing debounce in front of the repository.
//!
//! Runs as a task that owns the timer. The [`AutosaveHandle`] is cheap to
//! clone and only sends commands.
//!
//! ```text
//!   AutosaveHandle          mpsc          AutosaveActor (tokio task)
//!   ┌──────────────┐  ─────────────▶  ┌────────────────────────────┐
//!   │ .observe()   │                  │ last_saved, pending,       │
//!   │ .flush()     │  ◀─────────────  │ deadline (one timer max)   │
//!   │ .close()     │     oneshot      │ JoinSet of in-flight saves │
//!   └──────────────┘                  └────────────────────────────┘
//! ```
//!
//! Each observed snapshot is compared with the last one handed to the sink.
//! Equal snapshots cancel whatever is pending; different ones (re)arm the
//! timer. When the timer fires the snapshot is saved in a spawned task and
//! immediately becomes `last_saved`, whether or not the save later succeeds.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_types::{DocumentId, Snapshot};
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace, warn};

use crate::error::RepoResult;
use crate::events::SessionEvent;

/// Timing for the coordinator.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before saving.
    pub delay: Duration,
    /// How long `is_saving` stays up after a save starts.
    pub indicator: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            indicator: Duration::from_millis(500),
        }
    }
}

/// Where fired snapshots go.
#[async_trait]
pub trait SaveSink: Send + Sync + 'static {
    async fn save(&self, snapshot: Snapshot) -> RepoResult<DocumentId>;
}

/// Errors from the actor system.
#[derive(Debug, thiserror::Error)]
pub enum AutosaveError {
    #[error("autosave coordinator shut down")]
    Shutdown,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveStatus {
    /// A change is waiting for its quiet period.
    pub pending: bool,
    /// Cosmetic: a save is running or started within the indicator window.
    pub is_saving: bool,
    pub saves_started: u64,
    pub saves_failed: u64,
}

#[derive(Debug, Default)]
struct SharedStatus {
    pending: bool,
    in_flight: usize,
    last_started: Option<Instant>,
    saves_started: u64,
    saves_failed: u64,
}

/// Counts one running save; released even if the save task panics or is
/// aborted.
struct InFlight(Arc<Mutex<SharedStatus>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut status = self.0.lock();
        status.in_flight = status.in_flight.saturating_sub(1);
    }
}

enum AutosaveCommand {
    Observe(Snapshot),
    Flush { reply: oneshot::Sender<()> },
    Close { reply: oneshot::Sender<()> },
}

/// Handle to a running coordinator.
#[derive(Clone)]
pub struct AutosaveHandle {
    tx: mpsc::UnboundedSender<AutosaveCommand>,
    status: Arc<Mutex<SharedStatus>>,
    indicator: Duration,
}

impl std::fmt::Debug for AutosaveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveHandle")
            .field("status", &self.status())
            .finish()
    }
}

impl AutosaveHandle {
    /// Report the latest `(title, blocks)`.
    pub fn observe(&self, snapshot: Snapshot) -> Result<(), AutosaveError> {
        self.tx
            .send(AutosaveCommand::Observe(snapshot))
            .map_err(|_| AutosaveError::Shutdown)
    }

    /// Save any pending snapshot now and wait for all in-flight saves.
    pub async fn flush(&self) -> Result<(), AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Flush { reply })
            .map_err(|_| AutosaveError::Shutdown)?;
        rx.await.map_err(|_| AutosaveError::Shutdown)
    }

    /// Cancel the pending timer, let in-flight saves finish, stop the task.
    pub async fn close(&self) -> Result<(), AutosaveError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Close { reply })
            .map_err(|_| AutosaveError::Shutdown)?;
        rx.await.map_err(|_| AutosaveError::Shutdown)
    }

    pub fn status(&self) -> AutosaveStatus {
        let status = self.status.lock();
        let in_window = status
            .last_started
            .is_some_and(|t| Instant::now() < t + self.indicator);
        AutosaveStatus {
            pending: status.pending,
            is_saving: status.in_flight > 0 || in_window,
            saves_started: status.saves_started,
            saves_failed: status.saves_failed,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.status().is_saving
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct AutosaveActor {
    config: AutosaveConfig,
    sink: Arc<dyn SaveSink>,
    events: broadcast::Sender<SessionEvent>,
    status: Arc<Mutex<SharedStatus>>,
    last_saved: Snapshot,
    pending: Option<Snapshot>,
    deadline: Option<Instant>,
    saves: JoinSet<()>,
}

impl AutosaveActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<AutosaveCommand>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(AutosaveCommand::Observe(snapshot)) => self.observe(snapshot),
                    Some(AutosaveCommand::Flush { reply }) => {
                        self.fire();
                        self.drain().await;
                        let _ = reply.send(());
                    }
                    Some(AutosaveCommand::Close { reply }) => {
                        self.cancel();
                        self.drain().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.cancel();
                        self.drain().await;
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire();
                }
                Some(joined) = self.saves.join_next(), if !self.saves.is_empty() => {
                    if let Err(e) = joined {
                        warn!("autosave task failed: {e}");
                    }
                }
            }
        }
        debug!("autosave coordinator stopped");
    }

    fn observe(&mut self, snapshot: Snapshot) {
        if snapshot == self.last_saved {
            if self.pending.is_some() {
                trace!("snapshot matches last save, dropping pending save");
            }
            self.cancel();
            return;
        }
        self.pending = Some(snapshot);
        self.deadline = Some(Instant::now() + self.config.delay);
        self.status.lock().pending = true;
    }

    fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
        self.status.lock().pending = false;
    }

    fn fire(&mut self) {
        self.deadline = None;
        let Some(snapshot) = self.pending.take() else {
            return;
        };
        self.last_saved = snapshot.clone();
        {
            let mut status = self.status.lock();
            status.pending = false;
            status.in_flight += 1;
            status.saves_started += 1;
            status.last_started = Some(Instant::now());
        }
        debug!(blocks = snapshot.blocks.len(), "autosave firing");
        let _ = self.events.send(SessionEvent::SaveStarted);

        let sink = self.sink.clone();
        let events = self.events.clone();
        let status = self.status.clone();
        let in_flight = InFlight(status.clone());
        self.saves.spawn(async move {
            let result = sink.save(snapshot).await;
            drop(in_flight);
            match result {
                Ok(document_id) => {
                    let _ = events.send(SessionEvent::Saved { document_id });
                }
                Err(e) => {
                    status.lock().saves_failed += 1;
                    warn!("autosave failed: {e}");
                    let _ = events.send(SessionEvent::SaveFailed {
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    async fn drain(&mut self) {
        while let Some(joined) = self.saves.join_next().await {
            if let Err(e) = joined {
                warn!("autosave task failed: {e}");
            }
        }
    }
}

/// Start a coordinator on the current tokio runtime.
///
/// `last_saved` is the snapshot already in storage (or the fresh empty
/// document), so opening a document never triggers a save by itself.
pub fn spawn_autosave(
    config: AutosaveConfig,
    sink: Arc<dyn SaveSink>,
    last_saved: Snapshot,
    events: broadcast::Sender<SessionEvent>,
) -> AutosaveHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let status = Arc::new(Mutex::new(SharedStatus::default()));
    let indicator = config.indicator;
    let actor = AutosaveActor {
        config,
        sink,
        events,
        status: status.clone(),
        last_saved,
        pending: None,
        deadline: None,
        saves: JoinSet::new(),
    };
    tokio::spawn(actor.run(rx));
    AutosaveHandle {
        tx,
        status,
        indicator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepoError;
    use folio_types::{Block, BlockId, BlockKind};
    use tokio::time::sleep;

    struct RecordingSink {
        start: Instant,
        saves: Mutex<Vec<(Duration, Snapshot)>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                saves: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn saves(&self) -> Vec<(Duration, Snapshot)> {
            self.saves.lock().clone()
        }
    }

    #[async_trait]
    impl SaveSink for RecordingSink {
        async fn save(&self, snapshot: Snapshot) -> RepoResult<DocumentId> {
            self.saves.lock().push((self.start.elapsed(), snapshot));
            if self.fail {
                Err(RepoError::storage("rejected"))
            } else {
                Ok(DocumentId::new(1))
            }
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl SaveSink for PanickingSink {
        async fn save(&self, _snapshot: Snapshot) -> RepoResult<DocumentId> {
            panic!("sink blew up");
        }
    }

    fn snap(text: &str) -> Snapshot {
        Snapshot::new(
            "doc",
            vec![Block::new(BlockId::new("1"), BlockKind::Paragraph).with_content(text)],
        )
    }

    fn spawn(sink: Arc<RecordingSink>) -> (AutosaveHandle, broadcast::Receiver<SessionEvent>) {
        let (events, rx) = broadcast::channel(16);
        let handle = spawn_autosave(AutosaveConfig::default(), sink, snap(""), events);
        (handle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_saves_once_with_final_state() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("s1")).unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.observe(snap("s2")).unwrap();
        sleep(Duration::from_millis(500)).await;
        handle.observe(snap("s3")).unwrap();

        sleep(Duration::from_millis(1990)).await;
        assert!(sink.saves().is_empty());
        assert!(handle.status().pending);

        sleep(Duration::from_millis(20)).await;
        let saves = sink.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, Duration::from_millis(3000));
        assert_eq!(saves[0].1, snap("s3"));

        sleep(Duration::from_secs(10)).await;
        assert_eq!(sink.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_snapshot_never_saves() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("")).unwrap();
        handle.observe(snap("")).unwrap();
        sleep(Duration::from_secs(10)).await;
        assert!(sink.saves().is_empty());
        assert_eq!(handle.status().saves_started, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_snapshot_after_save_is_ignored() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("a")).unwrap();
        sleep(Duration::from_secs(3)).await;
        handle.observe(snap("a")).unwrap();
        sleep(Duration::from_secs(3)).await;
        assert_eq!(sink.saves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_saved_state_cancels_pending() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("edited")).unwrap();
        sleep(Duration::from_millis(100)).await;
        handle.observe(snap("")).unwrap();
        sleep(Duration::from_secs(5)).await;
        assert!(sink.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_save() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("x")).unwrap();
        handle.close().await.unwrap();
        sleep(Duration::from_secs(5)).await;
        assert!(sink.saves().is_empty());
        assert!(handle.is_closed());
        assert!(matches!(
            handle.observe(snap("y")),
            Err(AutosaveError::Shutdown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_pending_save() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());
        handle.observe(snap("x")).unwrap();
        drop(handle);
        sleep(Duration::from_secs(5)).await;
        assert!(sink.saves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_immediately() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("now")).unwrap();
        handle.flush().await.unwrap();
        let saves = sink.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].0, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_reported_and_not_retried() {
        let sink = RecordingSink::new(true);
        let (handle, mut rx) = spawn(sink.clone());

        handle.observe(snap("doomed")).unwrap();
        sleep(Duration::from_millis(2100)).await;

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::SaveStarted);
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::SaveFailed { .. }));
        assert_eq!(handle.status().saves_failed, 1);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(sink.saves().len(), 1);

        // The next real change is the retry.
        handle.observe(snap("doomed again")).unwrap();
        sleep(Duration::from_millis(2100)).await;
        assert_eq!(sink.saves().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saving_indicator_window() {
        let sink = RecordingSink::new(false);
        let (handle, _rx) = spawn(sink.clone());

        handle.observe(snap("x")).unwrap();
        assert!(!handle.is_saving());
        sleep(Duration::from_millis(2100)).await;
        assert!(handle.is_saving());
        sleep(Duration::from_millis(500)).await;
        assert!(!handle.is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_save_clears_indicator() {
        let (events, _rx) = broadcast::channel(16);
        let handle = spawn_autosave(
            AutosaveConfig::default(),
            Arc::new(PanickingSink),
            snap(""),
            events,
        );

        handle.observe(snap("x")).unwrap();
        handle.flush().await.unwrap();
        assert_eq!(handle.status().saves_started, 1);
        sleep(Duration::from_millis(600)).await;
        assert!(!handle.is_saving());
        assert!(!handle.is_closed());
    }
}
