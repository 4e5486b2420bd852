//! Background refresh of the mirrored screen.

use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use tracing::debug;

use crate::common::mutex_lock_or_recover;
use crate::domain::ImageSize;
use crate::domain::Screenshot;
use crate::usecases::ports::AppSession;
use crate::usecases::ports::ServiceError;
use crate::usecases::recorder::ActionRecorder;
use crate::usecases::status::StatusBoard;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Latest screenshot plus the native size it reveals.
///
/// Refreshing only reads from the device; the known screen size is forwarded to the recorder so
/// remote points can be clamped. A good frame clears a degraded mirror status.
#[derive(Clone)]
pub struct ScreenshotFeed {
    session: Arc<dyn AppSession>,
    recorder: ActionRecorder,
    status: StatusBoard,
    latest: Arc<Mutex<Option<Screenshot>>>,
}

impl ScreenshotFeed {
    pub fn new(
        session: Arc<dyn AppSession>,
        recorder: ActionRecorder,
        status: StatusBoard,
    ) -> Self {
        Self {
            session,
            recorder,
            status,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    pub fn latest(&self) -> Option<Screenshot> {
        mutex_lock_or_recover(&self.latest).clone()
    }

    pub fn native_size(&self) -> Option<ImageSize> {
        mutex_lock_or_recover(&self.latest)
            .as_ref()
            .and_then(|shot| shot.size)
    }

    /// Fetches one frame and makes it the latest.
    pub fn refresh(&self) -> Result<Screenshot, ServiceError> {
        let shot = self.session.screenshot()?;
        if let Some(size) = shot.size {
            let _ = self.recorder.set_screen(Some(size));
        }
        *mutex_lock_or_recover(&self.latest) = Some(shot.clone());
        self.status.mirror_restored();
        Ok(shot)
    }

    pub fn clear(&self) {
        *mutex_lock_or_recover(&self.latest) = None;
        let _ = self.recorder.set_screen(None);
    }

    /// Refreshes every `interval` until the handle is dropped.
    pub fn start(&self, interval: Duration) -> io::Result<FeedHandle> {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let feed = self.clone();
        let thread = thread::Builder::new()
            .name("screenshot-feed".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Err(err) = feed.refresh() {
                                debug!(error = %err, "Screenshot refresh failed");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;
        Ok(FeedHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

/// Running refresh loop. Dropping it stops the loop.
pub struct FeedHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
