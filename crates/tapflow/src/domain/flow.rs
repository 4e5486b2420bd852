//! Persisted flows and their save payload.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::action::RecordedAction;
use super::device::ApkInfo;
use super::device::DEFAULT_LAUNCH_ACTIVITY;

pub const SAVED_DEVICE_PLATFORM: &str = "Android";
const UNKNOWN_DEVICE_NAME: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowValidationError {
    #[error("no actions to save")]
    NoActions,
    #[error("flow name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMetadata {
    pub recorded_at: String,
    pub total_steps: usize,
}

/// Request body for persisting a recorded Action List.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDraft {
    pub name: String,
    pub description: String,
    pub device_id: String,
    pub device_name: String,
    pub device_platform: String,
    pub device_os_version: String,
    pub app_package: String,
    pub app_name: String,
    pub app_version: String,
    pub app_activity: String,
    pub steps: Vec<RecordedAction>,
    pub flow_metadata: FlowMetadata,
}

/// Device and app context captured with a flow.
#[derive(Debug, Clone, Copy)]
pub struct FlowContext<'a> {
    pub device_id: &'a str,
    pub device_name: Option<&'a str>,
    pub apk: Option<&'a ApkInfo>,
    pub recorded_at: &'a str,
}

impl FlowDraft {
    /// Validates the name and list, then assembles the payload.
    ///
    /// The name is trimmed for validation only; the stored name is what the tester typed.
    pub fn build(
        name: &str,
        actions: &[RecordedAction],
        context: FlowContext<'_>,
    ) -> Result<Self, FlowValidationError> {
        if actions.is_empty() {
            return Err(FlowValidationError::NoActions);
        }
        if name.trim().is_empty() {
            return Err(FlowValidationError::EmptyName);
        }

        let apk = context.apk;
        let app_name = apk.and_then(|a| a.app_name.as_deref()).unwrap_or_default();
        let app_version = apk.and_then(|a| a.version.as_deref()).unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            description: format!("Automated test - {} steps", actions.len()),
            device_id: context.device_id.to_string(),
            device_name: context
                .device_name
                .filter(|n| !n.is_empty())
                .unwrap_or(UNKNOWN_DEVICE_NAME)
                .to_string(),
            device_platform: SAVED_DEVICE_PLATFORM.to_string(),
            device_os_version: String::new(),
            app_package: apk.map(|a| a.package_name.clone()).unwrap_or_default(),
            app_name: app_name.to_string(),
            app_version: app_version.to_string(),
            app_activity: apk
                .map(|a| a.activity_or_default())
                .unwrap_or(DEFAULT_LAUNCH_ACTIVITY)
                .to_string(),
            steps: actions.to_vec(),
            flow_metadata: FlowMetadata {
                recorded_at: context.recorded_at.to_string(),
                total_steps: actions.len(),
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDeviceInfo {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowAppInfo {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// A flow as returned by the flow store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub device_info: FlowDeviceInfo,
    #[serde(default)]
    pub app_info: FlowAppInfo,
    #[serde(default)]
    pub steps: Vec<RecordedAction>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    #[default]
    Javascript,
    Python,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid language '{invalid_value}'. Must be one of: javascript, python")]
pub struct CodeLanguageParseError {
    pub invalid_value: String,
}

impl CodeLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Python => "python",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Self::Javascript => "js",
            Self::Python => "py",
        }
    }
}

impl fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CodeLanguage {
    type Err = CodeLanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Ok(Self::Javascript),
            "python" | "py" => Ok(Self::Python),
            _ => Err(CodeLanguageParseError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionSource;
    use crate::domain::DevicePoint;
    use crate::domain::PendingAction;

    fn actions(n: u32) -> Vec<RecordedAction> {
        (1..=n)
            .map(|step| {
                RecordedAction::from_pending(
                    step,
                    PendingAction::tap(DevicePoint::new(step, step), ActionSource::LocalDesktop, 0),
                )
            })
            .collect()
    }

    fn context<'a>(apk: Option<&'a ApkInfo>) -> FlowContext<'a> {
        FlowContext {
            device_id: "emulator-5554",
            device_name: Some("Pixel 7"),
            apk,
            recorded_at: "2026-01-01T00:00:00Z",
        }
    }

    #[test]
    fn test_blank_name_is_rejected() {
        assert_eq!(
            FlowDraft::build("   ", &actions(2), context(None)),
            Err(FlowValidationError::EmptyName)
        );
    }

    #[test]
    fn test_empty_list_is_rejected_before_name() {
        assert_eq!(
            FlowDraft::build("", &[], context(None)),
            Err(FlowValidationError::NoActions)
        );
    }

    #[test]
    fn test_draft_carries_device_and_app_context() {
        let apk = ApkInfo {
            package_name: "com.example.shop".to_string(),
            app_name: Some("Shop".to_string()),
            version: Some("2.1.0".to_string()),
            launch_activity: None,
            already_installed: false,
        };
        let draft = FlowDraft::build("Checkout", &actions(3), context(Some(&apk))).unwrap();
        assert_eq!(draft.description, "Automated test - 3 steps");
        assert_eq!(draft.device_name, "Pixel 7");
        assert_eq!(draft.device_platform, "Android");
        assert_eq!(draft.app_package, "com.example.shop");
        assert_eq!(draft.app_activity, DEFAULT_LAUNCH_ACTIVITY);
        assert_eq!(draft.flow_metadata.total_steps, 3);
        assert_eq!(draft.steps.len(), 3);
    }

    #[test]
    fn test_unknown_device_name() {
        let ctx = FlowContext {
            device_name: None,
            ..context(None)
        };
        let draft = FlowDraft::build("Smoke", &actions(1), ctx).unwrap();
        assert_eq!(draft.device_name, "Unknown");
        assert_eq!(draft.app_package, "");
    }

    #[test]
    fn test_language_parsing_accepts_extensions() {
        assert_eq!("py".parse::<CodeLanguage>().unwrap(), CodeLanguage::Python);
        assert_eq!(
            "JavaScript".parse::<CodeLanguage>().unwrap(),
            CodeLanguage::Javascript
        );
        assert!("ruby".parse::<CodeLanguage>().is_err());
    }
}
