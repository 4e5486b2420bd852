//! Decoding of push-channel frames.
//!
//! Frames are JSON objects with a `type` tag. Payload fields may sit at the top level or under
//! `data`; both placements are accepted. Unknown types are ignored.

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::domain::InstallProgress;
use crate::usecases::ports::PushEvent;
use crate::usecases::ports::RemoteTouch;

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Frame {
    fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).or_else(|| {
            self.fields
                .get("data")
                .and_then(Value::as_object)
                .and_then(|data| data.get(key))
        })
    }

    fn device_id(&self) -> Option<String> {
        match self.field("device_id")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TouchFrame {
    Tap {
        x: f64,
        y: f64,
    },
    Swipe {
        start_x: f64,
        start_y: f64,
        end_x: f64,
        end_y: f64,
        #[serde(default)]
        duration: Option<f64>,
    },
    #[serde(alias = "longpress")]
    LongPress {
        x: f64,
        y: f64,
        #[serde(default)]
        duration: Option<f64>,
    },
}

impl From<TouchFrame> for RemoteTouch {
    fn from(frame: TouchFrame) -> Self {
        match frame {
            TouchFrame::Tap { x, y } => RemoteTouch::Tap { x, y },
            TouchFrame::Swipe {
                start_x,
                start_y,
                end_x,
                end_y,
                duration,
            } => RemoteTouch::Swipe {
                start_x,
                start_y,
                end_x,
                end_y,
                duration_secs: duration,
            },
            TouchFrame::LongPress { x, y, duration } => RemoteTouch::LongPress {
                x,
                y,
                duration_secs: duration,
            },
        }
    }
}

/// Decodes one text frame. Returns `None` for frames that carry no event this recorder uses.
pub fn parse_push_message(text: &str) -> Option<PushEvent> {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(error = %err, "Ignoring malformed push frame");
            return None;
        }
    };

    match frame.kind.as_str() {
        "mobile_action" => {
            let device_id = frame.device_id()?;
            let action = frame.field("action")?.clone();
            match serde_json::from_value::<TouchFrame>(action) {
                Ok(touch) => Some(PushEvent::MobileAction {
                    device_id,
                    touch: touch.into(),
                }),
                Err(err) => {
                    debug!(error = %err, "Ignoring unsupported mobile action");
                    None
                }
            }
        }
        "installation_progress" => Some(PushEvent::InstallationProgress(InstallProgress {
            device_id: frame.device_id()?,
            progress: frame.field("progress").and_then(Value::as_f64).unwrap_or(0.0),
            message: frame
                .field("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })),
        "device_connected" => Some(PushEvent::DeviceConnected {
            device_id: frame.device_id()?,
        }),
        "device_disconnected" => Some(PushEvent::DeviceDisconnected {
            device_id: frame.device_id()?,
        }),
        other => {
            debug!(kind = other, "Ignoring push frame");
            None
        }
    }
}
