//! Error types shared by every dockercp crate.

use thiserror::Error;

/// Result alias used throughout dockercp.
pub type DockercpResult<T> = Result<T, DockercpError>;

/// Every way a fetch can fail.
///
/// Errors are raised where they are detected and propagate unchanged;
/// nothing in the pipeline retries or recovers locally.
#[derive(Debug, Error)]
pub enum DockercpError {
    /// No usable backend is compiled in, or the requested one is unavailable.
    #[error("{0}")]
    Config(String),

    /// The container engine could not be reached.
    #[error("cannot reach container engine: {0}")]
    Connection(String),

    /// The requested container is absent from the engine's listing.
    #[error("no such container: {0}")]
    ContainerNotFound(String),

    /// The engine answered the archive request with 404.
    #[error("no such path in container {container}: {path}")]
    PathNotFound {
        container: String,
        path: String,
        detail: String,
    },

    /// Any other non-success engine response.
    #[error("{}", format_backend(*status, detail))]
    Backend { status: Option<u16>, detail: String },

    /// The fetched archive could not be read, or its temporary file not removed.
    #[error("{0}")]
    Archive(String),

    /// Caller-supplied input is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn format_backend(status: Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("engine request failed (status code {}): {}", code, detail),
        None => format!("engine request failed: {}", detail),
    }
}

impl DockercpError {
    /// Build a `Backend` error from an HTTP status and the engine's message.
    pub fn backend_status(status: u16, detail: impl Into<String>) -> Self {
        Self::Backend {
            status: Some(status),
            detail: detail.into(),
        }
    }

    /// Build a `Backend` error that did not come with a status code.
    pub fn backend(detail: impl Into<String>) -> Self {
        Self::Backend {
            status: None,
            detail: detail.into(),
        }
    }

    /// True for both kinds of not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DockercpError::ContainerNotFound(_) | DockercpError::PathNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_carries_status() {
        let err = DockercpError::backend_status(500, "server exploded");
        assert_eq!(
            err.to_string(),
            "engine request failed (status code 500): server exploded"
        );

        let err = DockercpError::backend("socket closed");
        assert_eq!(err.to_string(), "engine request failed: socket closed");
    }

    #[test]
    fn test_not_found_messages() {
        let err = DockercpError::ContainerNotFound("web1".to_string());
        assert_eq!(err.to_string(), "no such container: web1");
        assert!(err.is_not_found());

        let err = DockercpError::PathNotFound {
            container: "web1".to_string(),
            path: "/etc/missing".to_string(),
            detail: "Could not find the file /etc/missing in container web1".to_string(),
        };
        assert_eq!(err.to_string(), "no such path in container web1: /etc/missing");
        assert!(err.is_not_found());

        assert!(!DockercpError::Archive("x".to_string()).is_not_found());
    }
}
