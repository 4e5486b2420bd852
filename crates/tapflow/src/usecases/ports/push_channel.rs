use std::fmt;
use std::sync::Arc;

use crate::domain::InstallProgress;
use crate::usecases::ports::ServiceError;

/// A touch captured on the physical device, in device pixels.
///
/// Durations are reported in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteTouch {
    Tap {
        x: f64,
        y: f64,
    },
    Swipe {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
        duration_secs: Option<f64>,
    },
    LongPress {
        x: f64,
        y: f64,
        duration_secs: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    MobileAction {
        device_id: String,
        touch: RemoteTouch,
    },
    InstallationProgress(InstallProgress),
    DeviceConnected {
        device_id: String,
    },
    DeviceDisconnected {
        device_id: String,
    },
}

impl PushEvent {
    pub fn device_id(&self) -> &str {
        match self {
            PushEvent::MobileAction { device_id, .. }
            | PushEvent::DeviceConnected { device_id }
            | PushEvent::DeviceDisconnected { device_id } => device_id,
            PushEvent::InstallationProgress(progress) => &progress.device_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PushEvent::MobileAction { .. } => "mobile_action",
            PushEvent::InstallationProgress(_) => "installation_progress",
            PushEvent::DeviceConnected { .. } => "device_connected",
            PushEvent::DeviceDisconnected { .. } => "device_disconnected",
        }
    }
}

pub type PushHandler = Arc<dyn Fn(PushEvent) + Send + Sync>;

/// Server-initiated event stream.
pub trait PushChannel: Send + Sync {
    /// Starts delivering events to `handler` until the returned subscription is dropped.
    fn subscribe(&self, handler: PushHandler) -> Result<PushSubscription, ServiceError>;
}

/// Live registration on a [`PushChannel`]. Cancelled on drop.
pub struct PushSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PushSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for PushSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
