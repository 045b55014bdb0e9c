//! Error types for the OData client engine

use crate::transport::TransportError;

/// Errors surfaced by the client engine
///
/// Resolution misses are deliberately absent: an unknown type degrades to a
/// passthrough parser and is reported through
/// [`Registry::unresolved`](crate::schema::Registry::unresolved) instead.
#[derive(Debug)]
pub enum ODataError {
    /// Malformed or self-contradictory configuration, fatal at setup
    Configuration { message: String },
    /// An operation that needs an entity key was invoked without one
    Identity {
        /// Rendered path of the resource that lacked a key
        path: String,
        /// Name of the attempted operation (e.g. "update")
        operation: &'static str,
    },
    /// The transport failed before a response was received
    Transport(TransportError),
    /// The service answered with a non-success status
    Http {
        status: u16,
        status_text: String,
        body: Option<String>,
    },
    /// The response body could not be read as the declared shape
    Payload { message: String },
    /// No transport has been installed on the client
    NoTransport,
}

impl ODataError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ODataError::Configuration {
            message: message.into(),
        }
    }

    /// Create an identity error for the given resource path
    pub fn identity(path: impl Into<String>, operation: &'static str) -> Self {
        ODataError::Identity {
            path: path.into(),
            operation,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ODataError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check whether this error was produced before any network activity
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ODataError::Configuration { .. } | ODataError::Identity { .. } | ODataError::NoTransport
        )
    }
}

impl std::fmt::Display for ODataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ODataError::Configuration { message } => write!(f, "configuration error: {}", message),
            ODataError::Identity { path, operation } => {
                write!(
                    f,
                    "cannot {} '{}': the resource has no entity key",
                    operation, path
                )
            }
            ODataError::Transport(err) => write!(f, "transport error: {}", err),
            ODataError::Http {
                status,
                status_text,
                ..
            } => write!(f, "service responded with {} {}", status, status_text),
            ODataError::Payload { message } => write!(f, "invalid payload: {}", message),
            ODataError::NoTransport => write!(f, "no transport configured for this client"),
        }
    }
}

impl std::error::Error for ODataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ODataError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for ODataError {
    fn from(err: TransportError) -> Self {
        ODataError::Transport(err)
    }
}

impl From<serde_json::Error> for ODataError {
    fn from(err: serde_json::Error) -> Self {
        ODataError::Payload {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_message() {
        let err = ODataError::identity("People", "delete");
        assert_eq!(
            err.to_string(),
            "cannot delete 'People': the resource has no entity key"
        );
        assert!(err.is_local());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_http_error_status() {
        let err = ODataError::Http {
            status: 404,
            status_text: "Not Found".into(),
            body: None,
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_local());
        assert_eq!(err.to_string(), "service responded with 404 Not Found");
    }

    #[test]
    fn test_transport_error_has_source() {
        use std::error::Error;
        let err: ODataError = TransportError::new("connection reset").into();
        assert!(err.source().is_some());
    }
}
