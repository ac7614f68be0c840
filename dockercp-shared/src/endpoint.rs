//! Engine endpoint description.

use std::path::{Path, PathBuf};

use crate::constants::engine::{DEFAULT_SOCKET_PATH, UNIX_SCHEME};
use crate::errors::{DockercpError, DockercpResult};

/// Location of a local container engine's control socket.
///
/// Only local Unix sockets are supported; remote engines are out of scope.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EngineEndpoint {
    socket_path: PathBuf,
}

impl EngineEndpoint {
    /// Create an endpoint for a Unix socket path.
    pub fn unix(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Path of the control socket.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the URI representation of this endpoint.
    pub fn to_uri(&self) -> String {
        format!("{}{}", UNIX_SCHEME, self.socket_path.display())
    }

    /// Parse an endpoint from a `unix:///path` URI.
    pub fn from_uri(uri: &str) -> DockercpResult<Self> {
        match uri.strip_prefix(UNIX_SCHEME) {
            Some(path) if !path.is_empty() => Ok(Self::unix(path)),
            Some(_) => Err(DockercpError::InvalidArgument(format!(
                "invalid engine URI '{}': missing socket path",
                uri
            ))),
            None => Err(DockercpError::InvalidArgument(format!(
                "invalid engine URI '{}': expected {}, remote engines are not supported",
                uri, UNIX_SCHEME
            ))),
        }
    }

    /// Resolve the local default endpoint from a `DOCKER_HOST`-style value.
    ///
    /// A value that is absent or not a `unix://` URI falls back to the
    /// well-known socket path.
    pub fn local_default(docker_host: Option<&str>) -> Self {
        docker_host
            .and_then(|value| Self::from_uri(value).ok())
            .unwrap_or_else(|| Self::unix(DEFAULT_SOCKET_PATH))
    }
}

impl Default for EngineEndpoint {
    fn default() -> Self {
        Self::unix(DEFAULT_SOCKET_PATH)
    }
}

impl std::fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

impl std::str::FromStr for EngineEndpoint {
    type Err = DockercpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}
