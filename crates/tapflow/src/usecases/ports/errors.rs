use thiserror::Error;

use crate::common::ErrorCategory;
use crate::domain::AppendRejected;
use crate::domain::FlowValidationError;
use crate::domain::MappingError;
use crate::domain::StageTransitionError;
use crate::domain::WizardStage;

/// Failure of a request to an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{service} is unreachable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },
    #[error("{service} timed out")]
    Timeout { service: &'static str },
    #[error("{service} returned HTTP {status}: {detail}")]
    Status {
        service: &'static str,
        status: u16,
        detail: String,
    },
    #[error("{service} sent an unreadable response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },
    #[error("{service} failed: {reason}")]
    Failed {
        service: &'static str,
        reason: String,
    },
}

impl ServiceError {
    pub fn service(&self) -> &'static str {
        match self {
            ServiceError::Unavailable { service, .. }
            | ServiceError::Timeout { service }
            | ServiceError::Status { service, .. }
            | ServiceError::Decode { service, .. }
            | ServiceError::Failed { service, .. } => service,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::Timeout { .. } => ErrorCategory::Timeout,
            ServiceError::Status { status: 404, .. } => ErrorCategory::NotFound,
            ServiceError::Status { status, .. } if (400..500).contains(status) => {
                ErrorCategory::InvalidInput
            }
            _ => ErrorCategory::External,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Unavailable { .. } | ServiceError::Timeout { .. } => true,
            ServiceError::Status { status, .. } => *status >= 500,
            ServiceError::Decode { .. } | ServiceError::Failed { .. } => false,
        }
    }
}

/// Rejection of a session intent. The session is unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    #[error("{0}")]
    Validation(String),
    #[error("'{intent}' is not available in stage '{stage}'")]
    InvalidStage {
        intent: &'static str,
        stage: WizardStage,
    },
    #[error(transparent)]
    Transition(#[from] StageTransitionError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("capture skipped: {0}")]
    Mapping(#[from] MappingError),
    #[error("action rejected: {0}")]
    Append(#[from] AppendRejected),
    #[error("action recorder has shut down")]
    RecorderClosed,
}

impl From<FlowValidationError> for ControllerError {
    fn from(err: FlowValidationError) -> Self {
        ControllerError::Validation(err.to_string())
    }
}

impl ControllerError {
    pub fn validation(message: impl Into<String>) -> Self {
        ControllerError::Validation(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ControllerError::Validation(_) | ControllerError::Mapping(_) => {
                ErrorCategory::InvalidInput
            }
            ControllerError::InvalidStage { .. }
            | ControllerError::Transition(_)
            | ControllerError::Append(_) => ErrorCategory::Conflict,
            ControllerError::Service(err) => err.category(),
            ControllerError::RecorderClosed => ErrorCategory::Internal,
        }
    }

    pub fn suggestion(&self) -> String {
        match self {
            ControllerError::Validation(_) => {
                "Fix the highlighted input and try again.".to_string()
            }
            ControllerError::InvalidStage { stage, .. } => {
                format!("The session is at '{stage}'. Finish that stage or reset the session.")
            }
            ControllerError::Transition(_) => {
                "Stages only move forward. Reset to start a new recording.".to_string()
            }
            ControllerError::Service(err) if err.is_retryable() => format!(
                "{} did not respond. Check the backend is running and retry.",
                err.service()
            ),
            ControllerError::Service(err) => {
                format!("{} rejected the request. Retry after fixing the cause.", err.service())
            }
            ControllerError::Mapping(_) => {
                "Wait for the screen mirror to load before capturing.".to_string()
            }
            ControllerError::Append(_) => "Start recording before capturing actions.".to_string(),
            ControllerError::RecorderClosed => "Restart tapflow.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_categories() {
        let not_found = ServiceError::Status {
            service: "flow store",
            status: 404,
            detail: "Flow not found".to_string(),
        };
        assert_eq!(not_found.category(), ErrorCategory::NotFound);
        assert!(!not_found.is_retryable());

        let server = ServiceError::Status {
            service: "playback",
            status: 503,
            detail: String::new(),
        };
        assert_eq!(server.category(), ErrorCategory::External);
        assert!(server.is_retryable());

        let timeout = ServiceError::Timeout { service: "inspector" };
        assert_eq!(timeout.category(), ErrorCategory::Timeout);
    }

    #[test]
    fn test_validation_errors_are_invalid_input() {
        let err: ControllerError = FlowValidationError::EmptyName.into();
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
        assert_eq!(err.to_string(), "flow name must not be empty");
    }

    #[test]
    fn test_stage_errors_are_conflicts() {
        let err = ControllerError::InvalidStage {
            intent: "insert_wait",
            stage: WizardStage::Save,
        };
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.suggestion().contains("'save'"));
    }
}
