//! Wire shapes for the automation backend.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::domain::CodeLanguage;
use crate::domain::ElementDescriptor;
use crate::domain::RecordedAction;
use crate::usecases::ports::LaunchRequest;

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub detail: Value,
}

#[derive(Debug, Serialize)]
pub(super) struct StartSessionBody<'a> {
    pub device_id: &'a str,
    pub platform: &'a str,
    pub app_package: &'a str,
    pub app_activity: &'a str,
}

impl<'a> From<&'a LaunchRequest> for StartSessionBody<'a> {
    fn from(request: &'a LaunchRequest) -> Self {
        Self {
            device_id: &request.device_id,
            platform: &request.platform,
            app_package: &request.app_package,
            app_activity: &request.app_activity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionStarted {
    pub session_id: Value,
}

impl SessionStarted {
    pub fn id(&self) -> Option<String> {
        match &self.session_id {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ScreenshotBody {
    #[serde(default)]
    pub screenshot: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct TapBody {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct SwipeBody {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
    pub duration: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct MonitoringBody<'a> {
    pub device_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ElementLookup {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub element: Option<ElementDescriptor>,
}

impl ElementLookup {
    pub fn into_element(self) -> Option<ElementDescriptor> {
        if self.found { self.element } else { None }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreatedFlow {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct PlaybackBody<'a> {
    pub flow_id: i64,
    pub device_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CodegenBody<'a> {
    pub actions: &'a [RecordedAction],
    pub language: CodeLanguage,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeneratedSource {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub code: String,
}

fn default_success() -> bool {
    true
}

/// Renders a FastAPI `detail` field, which is either a message or a list of validation errors.
pub(super) fn detail_text(detail: &Value) -> String {
    match detail {
        Value::String(message) => message.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
