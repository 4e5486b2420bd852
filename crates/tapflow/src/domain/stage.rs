use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// One phase of the guided recording workflow.
///
/// Stages only move forward, one at a time. Returning to [`WizardStage::Device`] is reserved
/// for an explicit reset, which also clears the session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    #[default]
    Device,
    Apk,
    Install,
    Launch,
    Record,
    Save,
    Playback,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageTransitionError {
    #[error("cannot move from stage '{from}' to '{to}'")]
    NotAdjacent { from: WizardStage, to: WizardStage },
    #[error("stage '{0}' is terminal")]
    Terminal(WizardStage),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Invalid stage '{invalid_value}'. \
     Must be one of: device, apk, install, launch, record, save, playback"
)]
pub struct StageParseError {
    pub invalid_value: String,
}

impl WizardStage {
    pub const ALL: [WizardStage; 7] = [
        WizardStage::Device,
        WizardStage::Apk,
        WizardStage::Install,
        WizardStage::Launch,
        WizardStage::Record,
        WizardStage::Save,
        WizardStage::Playback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Apk => "apk",
            Self::Install => "install",
            Self::Launch => "launch",
            Self::Record => "record",
            Self::Save => "save",
            Self::Playback => "playback",
        }
    }

    pub fn next(&self) -> Option<WizardStage> {
        match self {
            Self::Device => Some(Self::Apk),
            Self::Apk => Some(Self::Install),
            Self::Install => Some(Self::Launch),
            Self::Launch => Some(Self::Record),
            Self::Record => Some(Self::Save),
            Self::Save => Some(Self::Playback),
            Self::Playback => None,
        }
    }

    /// Validates a forward transition and returns the target stage.
    pub fn advance_to(&self, to: WizardStage) -> Result<WizardStage, StageTransitionError> {
        match self.next() {
            None => Err(StageTransitionError::Terminal(*self)),
            Some(next) if next == to => Ok(next),
            Some(_) => Err(StageTransitionError::NotAdjacent { from: *self, to }),
        }
    }

    /// Whether the Action List may still change in this stage.
    pub fn is_capture_open(&self) -> bool {
        *self <= Self::Record
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WizardStage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == lowered)
            .ok_or_else(|| StageParseError {
                invalid_value: s.to_string(),
            })
    }
}
