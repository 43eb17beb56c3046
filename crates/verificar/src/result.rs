//! Result and error types for Verificar.

use thiserror::Error;

/// Result type for Verificar operations
pub type VerificarResult<T> = Result<T, VerificarError>;

/// Errors that can occur while running a verification scenario
#[derive(Debug, Error)]
pub enum VerificarError {
    /// Navigation to a URL failed (unreachable host, non-loadable response)
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// No element matched the locator within its timeout
    #[error("No element matched {query} within {timeout_ms}ms")]
    ElementNotFound {
        /// Locator description
        query: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// Strict matching found more than one qualifying element
    #[error("Locator {query} matched {count} elements, expected exactly one")]
    AmbiguousMatch {
        /// Locator description
        query: String,
        /// Number of elements that matched
        count: usize,
    },

    /// A wait condition was never satisfied
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Condition that was being waited for
        waiting_for: String,
    },

    /// A scenario assertion failed (test failure, not a crash)
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Expected-vs-actual diagnostic
        message: String,
    },

    /// Screenshot capture failed inside the driver
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Session-level driver failure (launch, protocol, closed page)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// I/O error writing a scenario artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerificarError {
    /// Whether this error is a test failure rather than an infrastructure fault
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_error_display() {
        let err = VerificarError::Navigation {
            url: "http://localhost:3004/ca/blog".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Navigation to http://localhost:3004/ca/blog failed: connection refused"
        );
    }

    #[test]
    fn test_element_not_found_display() {
        let err = VerificarError::ElementNotFound {
            query: "a with exact text \"Enllaç\"".to_string(),
            timeout_ms: 5000,
        };
        assert!(err.to_string().contains("5000ms"));
        assert!(err.to_string().contains("Enllaç"));
    }

    #[test]
    fn test_ambiguous_match_display() {
        let err = VerificarError::AmbiguousMatch {
            query: "a".to_string(),
            count: 3,
        };
        assert!(err.to_string().contains("matched 3 elements"));
    }

    #[test]
    fn test_timeout_display() {
        let err = VerificarError::Timeout {
            ms: 30_000,
            waiting_for: "network idle".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 30000ms waiting for network idle"
        );
    }

    #[test]
    fn test_is_assertion() {
        let failure = VerificarError::AssertionFailed {
            message: "missing text".to_string(),
        };
        assert!(failure.is_assertion());

        let timeout = VerificarError::Timeout {
            ms: 100,
            waiting_for: "network idle".to_string(),
        };
        assert!(!timeout.is_assertion());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: VerificarError = io.into();
        assert!(matches!(err, VerificarError::Io(_)));
    }
}
