//! Local capture pipelines: pointer drags and inspector hover/click.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::warn;

use crate::common::mutex_lock_or_recover;
use crate::domain::ActionSource;
use crate::domain::AppendRejected;
use crate::domain::CaptureMode;
use crate::domain::DevicePoint;
use crate::domain::DisplayPoint;
use crate::domain::ElementDescriptor;
use crate::domain::Gesture;
use crate::domain::ImageSize;
use crate::domain::PendingAction;
use crate::domain::RecordedAction;
use crate::domain::RenderedSize;
use crate::domain::SWIPE_EXECUTION_DURATION_MS;
use crate::domain::classify_drag;
use crate::domain::to_device_space;
use crate::usecases::dispatch::ExecutionDispatcher;
use crate::usecases::dispatch::ExecutionRequest;
use crate::usecases::ports::Clock;
use crate::usecases::ports::ControllerError;
use crate::usecases::ports::ElementInspector;
use crate::usecases::recorder::ActionRecorder;

pub const DEFAULT_HOVER_THROTTLE: Duration = Duration::from_millis(100);

/// A pointer position on the mirror image together with the image's layout size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: DisplayPoint,
    pub rendered: RenderedSize,
}

/// Last element hit-tested under the pointer.
#[derive(Debug, Default)]
pub struct ElementHitCache {
    hit: Option<ElementDescriptor>,
    last_lookup: Option<Instant>,
}

impl ElementHitCache {
    pub fn current(&self) -> Option<&ElementDescriptor> {
        self.hit.as_ref()
    }

    pub fn clear(&mut self) {
        self.hit = None;
    }

    /// Claims the lookup slot unless one was taken less than `interval` ago.
    fn try_claim(&mut self, now: Instant, interval: Duration) -> bool {
        match self.last_lookup {
            Some(last) if now.saturating_duration_since(last) < interval => false,
            _ => {
                self.last_lookup = Some(now);
                true
            }
        }
    }
}

#[derive(Debug, Default)]
struct CaptureState {
    drag_start: Option<DevicePoint>,
    hits: ElementHitCache,
}

pub struct CaptureEngine {
    recorder: ActionRecorder,
    dispatcher: ExecutionDispatcher,
    inspector: Arc<dyn ElementInspector>,
    clock: Arc<dyn Clock>,
    hover_throttle: Duration,
    state: Mutex<CaptureState>,
}

impl CaptureEngine {
    pub fn new(
        recorder: ActionRecorder,
        dispatcher: ExecutionDispatcher,
        inspector: Arc<dyn ElementInspector>,
        clock: Arc<dyn Clock>,
        hover_throttle: Duration,
    ) -> Self {
        Self {
            recorder,
            dispatcher,
            inspector,
            clock,
            hover_throttle,
            state: Mutex::new(CaptureState::default()),
        }
    }

    /// Starts a drag. The start point is stored in device space.
    pub fn pointer_down(
        &self,
        sample: PointerSample,
        native: Option<ImageSize>,
    ) -> Result<DevicePoint, ControllerError> {
        let start = map_sample(sample, native)?;
        mutex_lock_or_recover(&self.state).drag_start = Some(start);
        Ok(start)
    }

    /// Ends a drag and records at most one action.
    ///
    /// Returns `Ok(None)` when no drag was in progress, in inspector mode, or when the
    /// recorder refused the action because recording is off.
    pub fn pointer_up(
        &self,
        sample: PointerSample,
        native: Option<ImageSize>,
        mode: CaptureMode,
    ) -> Result<Option<RecordedAction>, ControllerError> {
        let Some(start) = mutex_lock_or_recover(&self.state).drag_start.take() else {
            return Ok(None);
        };
        let end = map_sample(sample, native)?;
        let Some(gesture) = classify_drag(start, end, mode) else {
            return Ok(None);
        };

        let pending = PendingAction::from_gesture(
            gesture,
            ActionSource::LocalDesktop,
            self.clock.epoch_millis(),
        );
        let Some(recorded) = self.record(pending)? else {
            return Ok(None);
        };
        self.dispatcher.dispatch(match gesture {
            Gesture::Tap(point) => ExecutionRequest::Tap(point),
            Gesture::Swipe { start, end, .. } => ExecutionRequest::Swipe {
                start,
                end,
                duration_ms: SWIPE_EXECUTION_DURATION_MS,
            },
        });
        Ok(Some(recorded))
    }

    pub fn cancel_drag(&self) {
        mutex_lock_or_recover(&self.state).drag_start = None;
    }

    /// Hit-tests the hovered point, at most once per throttle interval.
    ///
    /// Returns the cached element after the update.
    pub fn hover(
        &self,
        sample: PointerSample,
        native: Option<ImageSize>,
    ) -> Result<Option<ElementDescriptor>, ControllerError> {
        let point = map_sample(sample, native)?;
        let now = self.clock.now();
        {
            let mut state = mutex_lock_or_recover(&self.state);
            if !state.hits.try_claim(now, self.hover_throttle) {
                return Ok(state.hits.current().cloned());
            }
        }

        let lookup = self.inspector.element_at(point);

        let mut state = mutex_lock_or_recover(&self.state);
        match lookup {
            Ok(Some(element)) => {
                debug!(x = point.x, y = point.y, class = element.short_class(), "Element hit");
                state.hits.hit = Some(element);
            }
            Ok(None) => state.hits.clear(),
            Err(err) => {
                warn!(x = point.x, y = point.y, error = %err, "Element lookup failed");
            }
        }
        Ok(state.hits.current().cloned())
    }

    /// Pointer left the mirror image.
    pub fn leave(&self) {
        let mut state = mutex_lock_or_recover(&self.state);
        state.hits.clear();
        state.drag_start = None;
    }

    /// Records a tap on the cached element. A click with nothing cached is a no-op.
    pub fn inspector_click(
        &self,
        sample: PointerSample,
        native: Option<ImageSize>,
    ) -> Result<Option<RecordedAction>, ControllerError> {
        let Some(element) = mutex_lock_or_recover(&self.state).hits.current().cloned() else {
            return Ok(None);
        };
        let point = map_sample(sample, native)?;
        let pending = PendingAction::inspected_tap(point, element, self.clock.epoch_millis());
        let Some(recorded) = self.record(pending)? else {
            return Ok(None);
        };
        self.dispatcher.dispatch(ExecutionRequest::Tap(point));
        Ok(Some(recorded))
    }

    pub fn cached_element(&self) -> Option<ElementDescriptor> {
        mutex_lock_or_recover(&self.state).hits.current().cloned()
    }

    pub fn reset(&self) {
        *mutex_lock_or_recover(&self.state) = CaptureState::default();
    }

    fn record(&self, pending: PendingAction) -> Result<Option<RecordedAction>, ControllerError> {
        match self.recorder.append(pending) {
            Ok(recorded) => Ok(Some(recorded)),
            Err(ControllerError::Append(AppendRejected::NotRecording | AppendRejected::Frozen)) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

fn map_sample(
    sample: PointerSample,
    native: Option<ImageSize>,
) -> Result<DevicePoint, ControllerError> {
    let native = native.unwrap_or(ImageSize::new(0, 0));
    Ok(to_device_space(sample.position, sample.rendered, native)?)
}
