//! JSON shapes accepted and returned by the UI API.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::domain::CodeLanguage;
use crate::domain::DisplayPoint;
use crate::domain::RenderedSize;
use crate::domain::WaitSeconds;
use crate::usecases::PointerSample;
use crate::usecases::SessionIntent;
use crate::usecases::ports::ControllerError;
use crate::usecases::ports::ServiceError;

/// Pointer position on the rendered mirror plus the mirror's layout size.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointerPayload {
    pub x: f64,
    pub y: f64,
    pub rendered_width: f64,
    pub rendered_height: f64,
}

impl From<PointerPayload> for PointerSample {
    fn from(payload: PointerPayload) -> Self {
        PointerSample {
            position: DisplayPoint {
                x: payload.x,
                y: payload.y,
            },
            rendered: RenderedSize {
                width: payload.rendered_width,
                height: payload.rendered_height,
            },
        }
    }
}

/// Body of `POST /api/v1/intents`, tagged by `intent`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentRequest {
    RefreshDevices,
    SelectDevice { device_id: String },
    Advance,
    AnalyzeApk { path: PathBuf },
    Install,
    Launch,
    SetMode { mode: String },
    ToggleRecording,
    PointerDown(PointerPayload),
    PointerUp(PointerPayload),
    Hover(PointerPayload),
    Leave,
    InspectorClick(PointerPayload),
    InsertWait { seconds: u64 },
    FinishRecording,
    Save { name: String },
    GenerateCode {
        #[serde(default)]
        language: Option<String>,
    },
    RunPlayback,
    ReplayLocally,
    Reset,
}

impl TryFrom<IntentRequest> for SessionIntent {
    type Error = ControllerError;

    fn try_from(request: IntentRequest) -> Result<Self, Self::Error> {
        let intent = match request {
            IntentRequest::RefreshDevices => SessionIntent::RefreshDevices,
            IntentRequest::SelectDevice { device_id } => SessionIntent::SelectDevice { device_id },
            IntentRequest::Advance => SessionIntent::Advance,
            IntentRequest::AnalyzeApk { path } => SessionIntent::AnalyzeApk { path },
            IntentRequest::Install => SessionIntent::Install,
            IntentRequest::Launch => SessionIntent::Launch,
            IntentRequest::SetMode { mode } => SessionIntent::SetMode(
                mode.parse()
                    .map_err(|err| ControllerError::validation(format!("{err}")))?,
            ),
            IntentRequest::ToggleRecording => SessionIntent::ToggleRecording,
            IntentRequest::PointerDown(p) => SessionIntent::PointerDown(p.into()),
            IntentRequest::PointerUp(p) => SessionIntent::PointerUp(p.into()),
            IntentRequest::Hover(p) => SessionIntent::Hover(p.into()),
            IntentRequest::Leave => SessionIntent::Leave,
            IntentRequest::InspectorClick(p) => SessionIntent::InspectorClick(p.into()),
            IntentRequest::InsertWait { seconds } => SessionIntent::InsertWait(
                WaitSeconds::try_from(seconds)
                    .map_err(|err| ControllerError::validation(err.to_string()))?,
            ),
            IntentRequest::FinishRecording => SessionIntent::FinishRecording,
            IntentRequest::Save { name } => SessionIntent::Save { name },
            IntentRequest::GenerateCode { language } => {
                let language = match language {
                    Some(raw) => raw
                        .parse::<CodeLanguage>()
                        .map_err(|err| ControllerError::validation(err.to_string()))?,
                    None => CodeLanguage::default(),
                };
                SessionIntent::GenerateCode(language)
            }
            IntentRequest::RunPlayback => SessionIntent::RunPlayback,
            IntentRequest::ReplayLocally => SessionIntent::ReplayLocally,
            IntentRequest::Reset => SessionIntent::Reset,
        };
        Ok(intent)
    }
}

/// Error body shared by the API and `--json` CLI output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub success: bool,
    pub error: String,
    pub category: &'static str,
    pub suggestion: String,
    pub retryable: bool,
}

impl ErrorPayload {
    pub fn new(
        error: impl Into<String>,
        category: &'static str,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: error.into(),
            category,
            suggestion: suggestion.into(),
            retryable: false,
        }
    }
}

impl From<&ControllerError> for ErrorPayload {
    fn from(err: &ControllerError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            category: err.category().as_str(),
            suggestion: err.suggestion(),
            retryable: matches!(err, ControllerError::Service(service) if service.is_retryable()),
        }
    }
}

impl From<&ServiceError> for ErrorPayload {
    fn from(err: &ServiceError) -> Self {
        Self::from(&ControllerError::Service(err.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CaptureMode;
    use crate::domain::WizardStage;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<SessionIntent, ControllerError> {
        let request: IntentRequest = serde_json::from_value(value).unwrap();
        SessionIntent::try_from(request)
    }

    #[test]
    fn test_pointer_intent_carries_layout() {
        let intent = parse(json!({
            "intent": "pointer_up",
            "x": 100.0,
            "y": 100.0,
            "rendered_width": 375.0,
            "rendered_height": 812.0
        }))
        .unwrap();
        assert_eq!(
            intent,
            SessionIntent::PointerUp(PointerSample {
                position: DisplayPoint { x: 100.0, y: 100.0 },
                rendered: RenderedSize {
                    width: 375.0,
                    height: 812.0
                },
            })
        );
    }

    #[test]
    fn test_mode_and_language_are_parsed() {
        assert_eq!(
            parse(json!({"intent": "set_mode", "mode": "Inspector"})).unwrap(),
            SessionIntent::SetMode(CaptureMode::Inspector)
        );
        assert_eq!(
            parse(json!({"intent": "generate_code"})).unwrap(),
            SessionIntent::GenerateCode(CodeLanguage::Javascript)
        );
        assert_eq!(
            parse(json!({"intent": "generate_code", "language": "py"})).unwrap(),
            SessionIntent::GenerateCode(CodeLanguage::Python)
        );
    }

    #[test]
    fn test_invalid_values_are_validation_errors() {
        let err = parse(json!({"intent": "insert_wait", "seconds": 4})).unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert!(err.to_string().contains("1, 2, 3, 5"));

        let err = parse(json!({"intent": "set_mode", "mode": "pinch"})).unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
    }

    #[test]
    fn test_unknown_intent_is_rejected_by_serde() {
        assert!(serde_json::from_value::<IntentRequest>(json!({"intent": "teleport"})).is_err());
    }

    #[test]
    fn test_error_payload_from_stage_error() {
        let err = ControllerError::InvalidStage {
            intent: "save",
            stage: WizardStage::Record,
        };
        let payload = ErrorPayload::from(&err);
        assert!(!payload.success);
        assert_eq!(payload.category, "conflict");
        assert!(!payload.retryable);
    }

    #[test]
    fn test_error_payload_from_unreachable_service() {
        let err = ServiceError::Unavailable {
            service: "flow store",
            reason: "connection refused".to_string(),
        };
        let payload = ErrorPayload::from(&err);
        assert_eq!(payload.category, "external");
        assert!(payload.retryable);
        assert!(payload.suggestion.contains("flow store"));
    }
}
