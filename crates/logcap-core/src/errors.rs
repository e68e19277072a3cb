use thiserror::Error;

/// Result type alias using CaptureError
pub type Result<T> = std::result::Result<T, CaptureError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that tests and callers can match on
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Invalid session setup (empty pattern set, malformed pattern, unknown level)
    Configuration,
    /// A bounded wait did not observe a matching event before its deadline
    Timeout,
    /// A query-based assertion did not hold
    AssertionFailure,
}

impl CaptureErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            CaptureErrorKind::Configuration => "ERR_CONFIGURATION",
            CaptureErrorKind::Timeout => "ERR_TIMEOUT",
            CaptureErrorKind::AssertionFailure => "ERR_ASSERTION_FAILED",
        }
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for capture operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Session or config setup was rejected
    #[error("Invalid capture configuration: {reason}")]
    Configuration { reason: String },

    /// Poll helper deadline expired
    #[error("Timed out after {waited_ms}ms waiting for event matching {criteria}\n{rendering}")]
    Timeout {
        criteria: String,
        waited_ms: u64,
        rendering: String,
    },

    /// Assertion over captured events did not hold
    #[error("Assertion failed: expected {criteria}\n{rendering}")]
    AssertionFailure { criteria: String, rendering: String },
}

impl CaptureError {
    /// Shorthand for a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        CaptureError::Configuration {
            reason: reason.into(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> CaptureErrorKind {
        match self {
            CaptureError::Configuration { .. } => CaptureErrorKind::Configuration,
            CaptureError::Timeout { .. } => CaptureErrorKind::Timeout,
            CaptureError::AssertionFailure { .. } => CaptureErrorKind::AssertionFailure,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Criteria carried by timeout and assertion errors
    pub fn criteria(&self) -> Option<&str> {
        match self {
            CaptureError::Configuration { .. } => None,
            CaptureError::Timeout { criteria, .. }
            | CaptureError::AssertionFailure { criteria, .. } => Some(criteria),
        }
    }

    /// Diagnostic rendering of the captured records, if any
    pub fn rendering(&self) -> Option<&str> {
        match self {
            CaptureError::Configuration { .. } => None,
            CaptureError::Timeout { rendering, .. }
            | CaptureError::AssertionFailure { rendering, .. } => Some(rendering),
        }
    }
}

impl From<toml::de::Error> for CaptureError {
    fn from(err: toml::de::Error) -> Self {
        CaptureError::configuration(format!("TOML parse error: {}", err.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes_are_stable() {
        assert_eq!(CaptureErrorKind::Configuration.code(), "ERR_CONFIGURATION");
        assert_eq!(CaptureErrorKind::Timeout.code(), "ERR_TIMEOUT");
        assert_eq!(
            CaptureErrorKind::AssertionFailure.code(),
            "ERR_ASSERTION_FAILED"
        );
    }

    #[test]
    fn test_configuration_has_no_rendering() {
        let err = CaptureError::configuration("empty pattern set");
        assert_eq!(err.kind(), CaptureErrorKind::Configuration);
        assert_eq!(err.criteria(), None);
        assert_eq!(err.rendering(), None);
        assert!(err.to_string().contains("empty pattern set"));
    }

    #[test]
    fn test_assertion_failure_display_includes_rendering() {
        let err = CaptureError::AssertionFailure {
            criteria: "no errors logged".to_string(),
            rendering: "  #2 ERROR app.fail: failed".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("no errors logged"));
        assert!(text.contains("app.fail"));
        assert_eq!(err.code(), "ERR_ASSERTION_FAILED");
    }

    #[test]
    fn test_toml_error_converts_to_configuration() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("patterns = [");
        let err: CaptureError = parse.unwrap_err().into();
        assert_eq!(err.kind(), CaptureErrorKind::Configuration);
    }
}
