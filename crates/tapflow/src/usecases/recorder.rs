//! Single-writer owner of the Action List.
//!
//! Every producer (local gestures, inspector clicks, remote device touches, manual waits)
//! submits requests over one channel. The recorder thread applies them in arrival order, so
//! step numbers come from the list length at the moment of application.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;
use tracing::debug;
use tracing::warn;

use crate::domain::ActionList;
use crate::domain::AppendRejected;
use crate::domain::ImageSize;
use crate::domain::PendingAction;
use crate::domain::RecordedAction;
use crate::usecases::ports::ControllerError;

/// Monotonic change counter observed by UI clients.
#[derive(Debug, Clone, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecorderSnapshot {
    pub actions: Vec<RecordedAction>,
    pub recording: bool,
    pub frozen: bool,
}

type AppendReply = Sender<Result<RecordedAction, AppendRejected>>;

enum Command {
    Open(Sender<Result<(), AppendRejected>>),
    Close(Sender<usize>),
    Append {
        pending: PendingAction,
        reply: Option<AppendReply>,
    },
    InsertWait {
        pending: PendingAction,
        reply: AppendReply,
    },
    Freeze(Sender<Vec<RecordedAction>>),
    Clear(Sender<()>),
    SetScreen(Option<ImageSize>),
    Snapshot(Sender<RecorderSnapshot>),
}

/// Handle to the recorder thread. Cloning shares the same list.
#[derive(Clone)]
pub struct ActionRecorder {
    tx: Sender<Command>,
    revision: Revision,
}

impl ActionRecorder {
    pub fn spawn(revision: Revision) -> io::Result<Self> {
        let (tx, rx) = unbounded();
        let thread_revision = revision.clone();
        thread::Builder::new()
            .name("action-recorder".to_string())
            .spawn(move || run(rx, thread_revision))?;
        Ok(Self { tx, revision })
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    /// Opens a recording segment.
    pub fn open(&self) -> Result<(), ControllerError> {
        self.request(Command::Open)?.map_err(ControllerError::from)
    }

    /// Closes the segment. Appends applied after this are dropped. Returns the list length at
    /// the barrier.
    pub fn close(&self) -> Result<usize, ControllerError> {
        self.request(Command::Close)
    }

    /// Appends and waits for the assigned step.
    pub fn append(&self, pending: PendingAction) -> Result<RecordedAction, ControllerError> {
        self.request(|reply| Command::Append {
            pending,
            reply: Some(reply),
        })?
        .map_err(ControllerError::from)
    }

    /// Queues an append without waiting; rejections are only logged.
    pub fn submit(&self, pending: PendingAction) -> Result<(), ControllerError> {
        self.tx
            .send(Command::Append {
                pending,
                reply: None,
            })
            .map_err(|_| ControllerError::RecorderClosed)
    }

    pub fn insert_wait(&self, pending: PendingAction) -> Result<RecordedAction, ControllerError> {
        self.request(|reply| Command::InsertWait { pending, reply })?
            .map_err(ControllerError::from)
    }

    /// Freezes the list for good and returns its final contents.
    pub fn freeze(&self) -> Result<Vec<RecordedAction>, ControllerError> {
        self.request(Command::Freeze)
    }

    pub fn clear(&self) -> Result<(), ControllerError> {
        self.request(Command::Clear)
    }

    pub fn set_screen(&self, size: Option<ImageSize>) -> Result<(), ControllerError> {
        self.tx
            .send(Command::SetScreen(size))
            .map_err(|_| ControllerError::RecorderClosed)
    }

    pub fn snapshot(&self) -> Result<RecorderSnapshot, ControllerError> {
        self.request(Command::Snapshot)
    }

    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> Command) -> Result<T, ControllerError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx
            .send(build(reply_tx))
            .map_err(|_| ControllerError::RecorderClosed)?;
        reply_rx.recv().map_err(|_| ControllerError::RecorderClosed)
    }
}

fn run(rx: Receiver<Command>, revision: Revision) {
    let mut list = ActionList::new();
    for command in rx.iter() {
        match command {
            Command::Open(reply) => {
                let result = list.open_segment();
                if result.is_ok() {
                    revision.bump();
                }
                let _ = reply.send(result);
            }
            Command::Close(reply) => {
                let len = list.close_segment();
                revision.bump();
                let _ = reply.send(len);
            }
            Command::Append { pending, reply } => {
                let source = pending.source;
                let result = list.append(pending).cloned();
                match &result {
                    Ok(action) => {
                        revision.bump();
                        debug!(
                            step = action.step,
                            kind = action.kind.name(),
                            source = source.as_str(),
                            "Action recorded"
                        );
                    }
                    Err(reason) => {
                        debug!(source = source.as_str(), %reason, "Dropped action");
                    }
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::InsertWait { pending, reply } => {
                let result = list.insert_wait(pending).cloned();
                if result.is_ok() {
                    revision.bump();
                }
                let _ = reply.send(result);
            }
            Command::Freeze(reply) => {
                list.freeze();
                revision.bump();
                let _ = reply.send(list.actions().to_vec());
            }
            Command::Clear(reply) => {
                list.clear();
                revision.bump();
                let _ = reply.send(());
            }
            Command::SetScreen(size) => {
                if list.screen() != size {
                    debug!(?size, "Screen size updated");
                }
                list.set_screen(size);
            }
            Command::Snapshot(reply) => {
                let snapshot = RecorderSnapshot {
                    actions: list.actions().to_vec(),
                    recording: list.is_recording(),
                    frozen: list.is_frozen(),
                };
                let _ = reply.send(snapshot);
            }
        }
    }
    if list.is_recording() {
        warn!(actions = list.len(), "Recorder stopped while a segment was open");
    }
}
