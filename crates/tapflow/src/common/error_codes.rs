//! Error categories shared by the API and CLI surfaces.

/// sysexits.h codes used by the binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const USAGE: i32 = 64;
    pub const DATAERR: i32 = 65;
    pub const UNAVAILABLE: i32 = 69;
    pub const SOFTWARE: i32 = 70;
    pub const IOERR: i32 = 74;
    pub const TEMPFAIL: i32 = 75;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
    External,
    Timeout,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Internal => "internal",
            ErrorCategory::External => "external",
            ErrorCategory::Timeout => "timeout",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCategory::NotFound => 404,
            ErrorCategory::InvalidInput => 422,
            ErrorCategory::Conflict => 409,
            ErrorCategory::Internal => 500,
            ErrorCategory::External => 502,
            ErrorCategory::Timeout => 504,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCategory::InvalidInput => exit_codes::USAGE,
            ErrorCategory::Conflict => exit_codes::DATAERR,
            ErrorCategory::NotFound | ErrorCategory::External => exit_codes::UNAVAILABLE,
            ErrorCategory::Internal => exit_codes::SOFTWARE,
            ErrorCategory::Timeout => exit_codes::TEMPFAIL,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_a_usage_error() {
        assert_eq!(ErrorCategory::InvalidInput.exit_code(), exit_codes::USAGE);
        assert_eq!(ErrorCategory::InvalidInput.http_status(), 422);
    }

    #[test]
    fn test_external_failures_are_unavailable() {
        assert_eq!(ErrorCategory::External.exit_code(), exit_codes::UNAVAILABLE);
        assert_eq!(ErrorCategory::External.http_status(), 502);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
        assert_eq!(ErrorCategory::Timeout.as_str(), "timeout");
    }
}
