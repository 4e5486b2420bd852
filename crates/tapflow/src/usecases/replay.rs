//! Local replay of a frozen Action List through the gesture executor.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::info;
use tracing::warn;

use crate::domain::ActionKind;
use crate::domain::DEFAULT_LONG_PRESS_MS;
use crate::domain::DevicePoint;
use crate::domain::GESTURE_SETTLE_DELAY;
use crate::domain::PlaybackReport;
use crate::domain::PlaybackStatus;
use crate::domain::RecordedAction;
use crate::domain::StepOutcome;
use crate::domain::step_delay;
use crate::usecases::ports::Clock;
use crate::usecases::ports::GestureExecutor;
use crate::usecases::ports::ServiceError;
use crate::usecases::ports::Sleeper;

#[derive(Debug, Clone, Default)]
pub struct ReplayInput {
    pub flow_name: Option<String>,
    pub actions: Vec<RecordedAction>,
}

/// Cooperative stop signal checked between steps.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn rearm(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub trait ReplayUseCase: Send + Sync {
    fn execute(&self, input: ReplayInput, stop: &StopToken) -> PlaybackReport;
}

pub struct ReplayUseCaseImpl {
    executor: Arc<dyn GestureExecutor>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl ReplayUseCaseImpl {
    pub fn new(
        executor: Arc<dyn GestureExecutor>,
        sleeper: Arc<dyn Sleeper>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            executor,
            sleeper,
            clock,
        }
    }

    fn run_step(&self, action: &RecordedAction) -> Result<(), ServiceError> {
        match &action.kind {
            ActionKind::Tap { x, y, .. } => {
                let result = self.executor.tap(DevicePoint::new(*x, *y));
                self.sleeper.sleep(GESTURE_SETTLE_DELAY);
                result
            }
            ActionKind::Swipe {
                start_x,
                start_y,
                end_x,
                end_y,
                duration,
            } => {
                let result = self.executor.swipe(
                    DevicePoint::new(*start_x, *start_y),
                    DevicePoint::new(*end_x, *end_y),
                    *duration,
                );
                self.sleeper.sleep(GESTURE_SETTLE_DELAY);
                result
            }
            ActionKind::LongPress { x, y, duration } => {
                let point = DevicePoint::new(*x, *y);
                self.executor
                    .swipe(point, point, duration.unwrap_or(DEFAULT_LONG_PRESS_MS))
            }
            ActionKind::Wait { duration } => {
                self.sleeper
                    .sleep(std::time::Duration::from_millis(*duration));
                Ok(())
            }
        }
    }
}

impl ReplayUseCase for ReplayUseCaseImpl {
    #[tracing::instrument(skip(self, input, stop), fields(steps = input.actions.len()))]
    fn execute(&self, input: ReplayInput, stop: &StopToken) -> PlaybackReport {
        let mut report = PlaybackReport {
            flow_name: input.flow_name,
            total_steps: input.actions.len(),
            start_time: Some(self.clock.timestamp()),
            status: PlaybackStatus::Running,
            ..Default::default()
        };

        let mut stopped = false;
        for (index, action) in input.actions.iter().enumerate() {
            if stop.is_stopped() {
                stopped = true;
                break;
            }
            let outcome = match self.run_step(action) {
                Ok(()) => StepOutcome::ok(action.step, action.kind.name()),
                Err(err) => {
                    warn!(step = action.step, error = %err, "Replay step failed");
                    StepOutcome::failed(action.step, action.kind.name(), err.to_string())
                }
            };
            report.record(outcome);

            if let Some(next) = input.actions.get(index + 1) {
                self.sleeper
                    .sleep(step_delay(action.timestamp, next.timestamp));
            }
        }

        report.finish(stopped);
        report.end_time = Some(self.clock.timestamp());
        info!(
            successful = report.successful_steps,
            failed = report.failed_steps,
            status = ?report.status,
            "Replay finished"
        );
        report
    }
}
