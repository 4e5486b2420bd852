//! Recorded interaction steps.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::geometry::DevicePoint;
use super::gesture::Gesture;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionSource {
    #[default]
    LocalDesktop,
    LocalInspector,
    RemoteMobile,
}

impl ActionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalDesktop => "local-desktop",
            Self::LocalInspector => "local-inspector",
            Self::RemoteMobile => "remote-mobile",
        }
    }

    fn description_suffix(&self) -> &'static str {
        match self {
            Self::LocalDesktop => " [Desktop]",
            Self::LocalInspector => "",
            Self::RemoteMobile => " [Mobile 📱]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Bounds {
    pub fn contains(&self, point: DevicePoint) -> bool {
        let (x, y) = (i64::from(point.x), i64::from(point.y));
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// UI element metadata returned by an element-at-position lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_desc: Option<String>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub focused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

impl ElementDescriptor {
    /// Trailing segment of the fully qualified widget class.
    pub fn short_class(&self) -> &str {
        self.class_name
            .as_deref()
            .and_then(|class| class.rsplit('.').next())
            .unwrap_or("")
    }

    /// First non-empty of text, then resource id, then `element`.
    pub fn label(&self) -> &str {
        [self.text.as_deref(), self.resource_id.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .unwrap_or("element")
    }
}

/// Kind-specific payload of a recorded step.
///
/// Serialized flat alongside the step fields, tagged by `action`, which is the shape the flow
/// store and code generator consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    Tap {
        x: u32,
        y: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        element: Option<ElementDescriptor>,
    },
    Swipe {
        start_x: u32,
        start_y: u32,
        end_x: u32,
        end_y: u32,
        duration: u64,
    },
    LongPress {
        x: u32,
        y: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
    Wait {
        duration: u64,
    },
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tap { .. } => "tap",
            Self::Swipe { .. } => "swipe",
            Self::LongPress { .. } => "long_press",
            Self::Wait { .. } => "wait",
        }
    }

    pub fn tap(point: DevicePoint) -> Self {
        Self::Tap {
            x: point.x,
            y: point.y,
            element: None,
        }
    }

    pub fn swipe(start: DevicePoint, end: DevicePoint, duration_ms: u64) -> Self {
        Self::Swipe {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
            duration: duration_ms,
        }
    }

    /// Every device point the action references.
    pub fn points(&self) -> Vec<DevicePoint> {
        match self {
            Self::Tap { x, y, .. } | Self::LongPress { x, y, .. } => vec![DevicePoint::new(*x, *y)],
            Self::Swipe {
                start_x,
                start_y,
                end_x,
                end_y,
                ..
            } => vec![
                DevicePoint::new(*start_x, *start_y),
                DevicePoint::new(*end_x, *end_y),
            ],
            Self::Wait { .. } => Vec::new(),
        }
    }

    fn map_points(self, f: impl Fn(DevicePoint) -> DevicePoint) -> Self {
        match self {
            Self::Tap { x, y, element } => {
                let p = f(DevicePoint::new(x, y));
                Self::Tap {
                    x: p.x,
                    y: p.y,
                    element,
                }
            }
            Self::LongPress { x, y, duration } => {
                let p = f(DevicePoint::new(x, y));
                Self::LongPress {
                    x: p.x,
                    y: p.y,
                    duration,
                }
            }
            Self::Swipe {
                start_x,
                start_y,
                end_x,
                end_y,
                duration,
            } => {
                let start = f(DevicePoint::new(start_x, start_y));
                let end = f(DevicePoint::new(end_x, end_y));
                Self::swipe(start, end, duration)
            }
            wait @ Self::Wait { .. } => wait,
        }
    }
}

/// Manual pause lengths offered while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum WaitSeconds {
    One,
    Two,
    Three,
    Five,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid wait of {0}s. Must be one of: 1, 2, 3, 5")]
pub struct InvalidWaitDuration(pub u64);

impl WaitSeconds {
    pub fn seconds(&self) -> u64 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Five => 5,
        }
    }

    pub fn millis(&self) -> u64 {
        self.seconds() * 1000
    }
}

impl TryFrom<u64> for WaitSeconds {
    type Error = InvalidWaitDuration;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            other => Err(InvalidWaitDuration(other)),
        }
    }
}

impl From<WaitSeconds> for u64 {
    fn from(value: WaitSeconds) -> Self {
        value.seconds()
    }
}

/// An append request that has not been assigned a step number yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: i64,
    pub source: ActionSource,
}

impl PendingAction {
    pub fn from_gesture(gesture: Gesture, source: ActionSource, timestamp: i64) -> Self {
        match gesture {
            Gesture::Tap(point) => Self::tap(point, source, timestamp),
            Gesture::Swipe {
                start,
                end,
                duration_ms,
            } => Self::swipe(start, end, duration_ms, source, timestamp),
        }
    }

    pub fn tap(point: DevicePoint, source: ActionSource, timestamp: i64) -> Self {
        Self {
            description: format!(
                "Tap at ({}, {}){}",
                point.x,
                point.y,
                source.description_suffix()
            ),
            kind: ActionKind::tap(point),
            timestamp,
            source,
        }
    }

    pub fn swipe(
        start: DevicePoint,
        end: DevicePoint,
        duration_ms: u64,
        source: ActionSource,
        timestamp: i64,
    ) -> Self {
        Self {
            description: format!(
                "Swipe from ({},{}) to ({},{}){}",
                start.x,
                start.y,
                end.x,
                end.y,
                source.description_suffix()
            ),
            kind: ActionKind::swipe(start, end, duration_ms),
            timestamp,
            source,
        }
    }

    pub fn long_press(
        point: DevicePoint,
        duration_ms: Option<u64>,
        source: ActionSource,
        timestamp: i64,
    ) -> Self {
        let held = duration_ms
            .map(|ms| format!(" {:.1}s", ms as f64 / 1000.0))
            .unwrap_or_default();
        Self {
            description: format!(
                "Long press at ({}, {}){}{}",
                point.x,
                point.y,
                held,
                source.description_suffix()
            ),
            kind: ActionKind::LongPress {
                x: point.x,
                y: point.y,
                duration: duration_ms,
            },
            timestamp,
            source,
        }
    }

    pub fn inspected_tap(point: DevicePoint, element: ElementDescriptor, timestamp: i64) -> Self {
        Self {
            description: format!("🔍 Tap {} \"{}\"", element.short_class(), element.label()),
            kind: ActionKind::Tap {
                x: point.x,
                y: point.y,
                element: Some(element),
            },
            timestamp,
            source: ActionSource::LocalInspector,
        }
    }

    pub fn wait(seconds: WaitSeconds, timestamp: i64) -> Self {
        Self {
            description: format!("⏱️ Wait {}s", seconds.seconds()),
            kind: ActionKind::Wait {
                duration: seconds.millis(),
            },
            timestamp,
            source: ActionSource::LocalDesktop,
        }
    }

    pub(crate) fn with_clamped_points(
        mut self,
        clamp: impl Fn(DevicePoint) -> DevicePoint,
    ) -> Self {
        self.kind = self.kind.map_points(clamp);
        self
    }
}

/// One entry of the Action List. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAction {
    pub step: u32,
    #[serde(flatten)]
    pub kind: ActionKind,
    pub description: String,
    pub timestamp: i64,
    #[serde(default)]
    pub source: ActionSource,
}

impl RecordedAction {
    pub fn from_pending(step: u32, pending: PendingAction) -> Self {
        Self {
            step,
            kind: pending.kind,
            description: pending.description,
            timestamp: pending.timestamp,
            source: pending.source,
        }
    }
}
