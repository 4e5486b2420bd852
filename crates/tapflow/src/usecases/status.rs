//! Session status shared between the controller and background listeners.

use std::sync::Arc;
use std::sync::Mutex;

use serde::Serialize;

use crate::common::mutex_lock_or_recover;
use crate::domain::InstallProgress;
use crate::usecases::recorder::Revision;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusView {
    pub message: String,
    pub degraded: bool,
    pub device_connected: Option<bool>,
    pub install_progress: Option<InstallProgress>,
}

/// Status message board. Every write bumps the session revision.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    inner: Arc<Mutex<StatusView>>,
    revision: Revision,
}

impl StatusBoard {
    pub fn new(revision: Revision) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatusView::default())),
            revision,
        }
    }

    pub fn view(&self) -> StatusView {
        mutex_lock_or_recover(&self.inner).clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.update(|s| s.message = message.into());
    }

    pub fn set_degraded(&self, degraded: bool) {
        self.update(|s| s.degraded = degraded);
    }

    /// Clears the degraded flag once the mirror delivers a frame again.
    pub fn mirror_restored(&self) {
        let mut view = mutex_lock_or_recover(&self.inner);
        if !view.degraded {
            return;
        }
        view.degraded = false;
        view.message = "Screen mirror restored".to_string();
        drop(view);
        self.revision.bump();
    }

    pub fn set_install_progress(&self, progress: InstallProgress) {
        self.update(|s| {
            s.message = format!("Installing: {} ({:.0}%)", progress.message, progress.progress);
            s.install_progress = Some(progress);
        });
    }

    pub fn set_device_connected(&self, connected: bool, device_id: &str) {
        self.update(|s| {
            s.device_connected = Some(connected);
            if !connected {
                s.message = format!("Device {device_id} disconnected");
            }
        });
    }

    pub fn reset(&self) {
        self.update(|s| *s = StatusView::default());
    }

    fn update(&self, apply: impl FnOnce(&mut StatusView)) {
        apply(&mut mutex_lock_or_recover(&self.inner));
        self.revision.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_progress_updates_message() {
        let board = StatusBoard::new(Revision::default());
        board.set_install_progress(InstallProgress {
            device_id: "emulator-5554".to_string(),
            progress: 42.4,
            message: "Pushing package".to_string(),
        });
        let view = board.view();
        assert_eq!(view.message, "Installing: Pushing package (42%)");
        assert!(view.install_progress.is_some());
    }

    #[test]
    fn test_writes_bump_revision() {
        let revision = Revision::default();
        let board = StatusBoard::new(revision.clone());
        board.set_message("Ready");
        board.set_degraded(true);
        assert_eq!(revision.get(), 2);
        board.reset();
        assert_eq!(board.view(), StatusView::default());
    }

    #[test]
    fn test_mirror_restored_clears_degraded_once() {
        let revision = Revision::default();
        let board = StatusBoard::new(revision.clone());
        board.mirror_restored();
        assert_eq!(revision.get(), 0);

        board.set_degraded(true);
        board.mirror_restored();
        let view = board.view();
        assert!(!view.degraded);
        assert_eq!(view.message, "Screen mirror restored");
        assert_eq!(revision.get(), 2);
    }
}
