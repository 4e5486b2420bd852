//! Playback results and pacing.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

pub const MIN_STEP_DELAY: Duration = Duration::from_millis(1000);
pub const MAX_STEP_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(2500);
pub const GESTURE_SETTLE_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_WAIT_MS: u64 = 1000;
pub const DEFAULT_LONG_PRESS_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Running,
    #[default]
    Completed,
    CompletedWithErrors,
    Stopped,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub step: u32,
    pub action: String,
    pub error: String,
}

/// Outcome of executing one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: u32,
    pub action: String,
    pub result: Result<(), String>,
}

impl StepOutcome {
    pub fn ok(step: u32, action: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            result: Ok(()),
        }
    }

    pub fn failed(step: u32, action: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            result: Err(error.into()),
        }
    }
}

/// Aggregate of one playback run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackReport {
    #[serde(default)]
    pub flow_name: Option<String>,
    pub total_steps: usize,
    #[serde(default)]
    pub executed_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    #[serde(default)]
    pub errors: Vec<StepError>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: PlaybackStatus,
}

impl PlaybackReport {
    /// Folds step outcomes into counts. A failed step never hides the ones after it.
    pub fn aggregate(
        flow_name: Option<String>,
        total_steps: usize,
        outcomes: impl IntoIterator<Item = StepOutcome>,
    ) -> Self {
        let mut report = Self {
            flow_name,
            total_steps,
            status: PlaybackStatus::Running,
            ..Default::default()
        };
        for outcome in outcomes {
            report.record(outcome);
        }
        report.finish(false);
        report
    }

    pub fn record(&mut self, outcome: StepOutcome) {
        self.executed_steps += 1;
        match outcome.result {
            Ok(()) => self.successful_steps += 1,
            Err(error) => {
                self.failed_steps += 1;
                self.errors.push(StepError {
                    step: outcome.step,
                    action: outcome.action,
                    error,
                });
            }
        }
    }

    pub fn finish(&mut self, stopped: bool) {
        self.status = if stopped {
            PlaybackStatus::Stopped
        } else if self.failed_steps == 0 {
            PlaybackStatus::Completed
        } else {
            PlaybackStatus::CompletedWithErrors
        };
    }

    pub fn is_clean(&self) -> bool {
        self.failed_steps == 0
    }
}

/// Delay before the next step, derived from the recorded capture times.
///
/// Missing timestamps fall back to the default; recorded gaps are kept within 1 to 5 seconds.
pub fn step_delay(current_ts: i64, next_ts: i64) -> Duration {
    if current_ts <= 0 || next_ts <= 0 {
        return DEFAULT_STEP_DELAY;
    }
    let gap = u64::try_from(next_ts.saturating_sub(current_ts)).unwrap_or(0);
    Duration::from_millis(gap).clamp(MIN_STEP_DELAY, MAX_STEP_DELAY)
}
