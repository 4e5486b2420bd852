//! Push-channel consumers: device touches into the Action List, device presence into status.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::domain::ActionSource;
use crate::domain::DevicePoint;
use crate::domain::PendingAction;
use crate::domain::SWIPE_AUTHORING_DURATION_MS;
use crate::domain::device_point_from_raw;
use crate::usecases::ports::Clock;
use crate::usecases::ports::PushEvent;
use crate::usecases::ports::PushHandler;
use crate::usecases::ports::RemoteTouch;
use crate::usecases::recorder::ActionRecorder;
use crate::usecases::status::StatusBoard;

/// Converts a device-reported touch into an append request.
///
/// Coordinates are already in device pixels; they are only rounded here. Clamping to the
/// screen happens when the recorder applies the action.
pub fn remote_action(touch: &RemoteTouch, timestamp: i64) -> PendingAction {
    let source = ActionSource::RemoteMobile;
    match *touch {
        RemoteTouch::Tap { x, y } => PendingAction::tap(point(x, y), source, timestamp),
        RemoteTouch::Swipe {
            start_x,
            start_y,
            end_x,
            end_y,
            duration_secs,
        } => PendingAction::swipe(
            point(start_x, start_y),
            point(end_x, end_y),
            duration_secs
                .and_then(secs_to_millis)
                .unwrap_or(SWIPE_AUTHORING_DURATION_MS),
            source,
            timestamp,
        ),
        RemoteTouch::LongPress { x, y, duration_secs } => PendingAction::long_press(
            point(x, y),
            duration_secs.and_then(secs_to_millis),
            source,
            timestamp,
        ),
    }
}

fn point(x: f64, y: f64) -> DevicePoint {
    device_point_from_raw(x, y, None)
}

fn secs_to_millis(secs: f64) -> Option<u64> {
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0).round() as u64)
}

/// Appends `mobile_action` events for one device while a recording segment is open.
pub struct RemoteEventListener {
    device_id: String,
    recorder: ActionRecorder,
    clock: Arc<dyn Clock>,
}

impl RemoteEventListener {
    pub fn new(
        device_id: impl Into<String>,
        recorder: ActionRecorder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            recorder,
            clock,
        }
    }

    pub fn handle(&self, event: PushEvent) {
        let PushEvent::MobileAction { device_id, touch } = event else {
            return;
        };
        if device_id != self.device_id {
            debug!(device_id, selected = %self.device_id, "Ignoring touch from another device");
            return;
        }
        let pending = remote_action(&touch, self.clock.epoch_millis());
        if let Err(err) = self.recorder.submit(pending) {
            warn!(error = %err, "Remote action lost");
        }
    }

    pub fn into_handler(self) -> PushHandler {
        Arc::new(move |event| self.handle(event))
    }
}

/// Routes installation progress and presence events for one device to the status board.
pub fn status_handler(device_id: String, status: StatusBoard) -> PushHandler {
    Arc::new(move |event: PushEvent| {
        if event.device_id() != device_id {
            return;
        }
        match event {
            PushEvent::InstallationProgress(progress) => status.set_install_progress(progress),
            PushEvent::DeviceConnected { .. } => status.set_device_connected(true, &device_id),
            PushEvent::DeviceDisconnected { .. } => {
                warn!(device_id, "Selected device disconnected");
                status.set_device_connected(false, &device_id);
            }
            PushEvent::MobileAction { .. } => {}
        }
    })
}
