use crate::adapters::ErrorPayload;
use crate::app::commands::OutputFormat;

/// A failure that already knows how to render itself and which exit code to use.
#[derive(Debug)]
pub struct CliError {
    pub exit_code: i32,
    pub format: OutputFormat,
    pub payload: ErrorPayload,
}

impl CliError {
    pub fn new(format: OutputFormat, payload: ErrorPayload, exit_code: i32) -> Self {
        Self {
            exit_code,
            format,
            payload,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.payload.error)
    }
}

impl std::error::Error for CliError {}
