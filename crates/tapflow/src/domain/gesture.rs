use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::geometry::DevicePoint;

/// Drags shorter than this (device pixels) are always taps.
pub const TAP_DISTANCE_THRESHOLD: f64 = 20.0;

/// Duration stored on locally authored swipes.
pub const SWIPE_AUTHORING_DURATION_MS: u64 = 800;

/// Duration sent to the device when a locally authored swipe is echoed.
pub const SWIPE_EXECUTION_DURATION_MS: u64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    #[default]
    Tap,
    Swipe,
    Inspector,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid capture mode '{invalid_value}'. Must be one of: tap, swipe, inspector")]
pub struct CaptureModeParseError {
    pub invalid_value: String,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Swipe => "swipe",
            Self::Inspector => "inspector",
        }
    }

    pub fn uses_drag_pipeline(&self) -> bool {
        !matches!(self, Self::Inspector)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = CaptureModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tap" => Ok(Self::Tap),
            "swipe" => Ok(Self::Swipe),
            "inspector" => Ok(Self::Inspector),
            _ => Err(CaptureModeParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// Outcome of a completed pointer drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap(DevicePoint),
    Swipe {
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
    },
}

/// Classifies a pointer-down/pointer-up pair.
///
/// Returns `None` in inspector mode, which captures through hover and click instead.
pub fn classify_drag(start: DevicePoint, end: DevicePoint, mode: CaptureMode) -> Option<Gesture> {
    match mode {
        CaptureMode::Inspector => None,
        CaptureMode::Tap => Some(Gesture::Tap(start)),
        CaptureMode::Swipe => {
            if start.distance_to(end) < TAP_DISTANCE_THRESHOLD {
                Some(Gesture::Tap(start))
            } else {
                Some(Gesture::Swipe {
                    start,
                    end,
                    duration_ms: SWIPE_AUTHORING_DURATION_MS,
                })
            }
        }
    }
}
