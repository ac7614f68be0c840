//! Transport backends for reaching the container engine.
//!
//! A backend knows three things: how to connect, how to list container
//! names, and how to open an archive stream for a path inside a container.
//! Backends are compiled in through cargo features and register themselves
//! with [`registry`]; [`select_backend`] picks one in priority order.

use std::pin::Pin;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;
use dockercp_shared::errors::{DockercpError, DockercpResult};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::request::FetchRequest;

#[cfg(feature = "engine-client")]
pub mod engine_client;
#[cfg(feature = "local-socket")]
pub mod local_socket;
pub mod registry;

pub use registry::{available_backends, create_backend, is_registered};

/// Tar bytes produced by the engine, consumed exactly once.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = DockercpResult<Bytes>> + Send>>;

/// Available transport backends.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Structured engine client library.
    EngineClient,
    /// Raw HTTP over the engine's control socket.
    LocalSocket,
}

impl BackendKind {
    /// Probe order used when no backend is requested explicitly.
    pub const PRIORITY: [BackendKind; 2] = [BackendKind::EngineClient, BackendKind::LocalSocket];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::EngineClient => "engine-client",
            BackendKind::LocalSocket => "local-socket",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = DockercpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "engine-client" => Ok(BackendKind::EngineClient),
            "local-socket" => Ok(BackendKind::LocalSocket),
            _ => Err(DockercpError::InvalidArgument(format!(
                "Unknown backend: '{}'. Supported: engine-client, local-socket",
                s
            ))),
        }
    }
}

/// A way of talking to the container engine.
///
/// Stages are separate calls so the orchestrator can drive them one by one.
/// `list_containers` and `download` fail with a `Connection` error when
/// called before `connect`.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Establish the session with the engine.
    async fn connect(&mut self) -> DockercpResult<()>;

    /// Names of all containers, stopped ones included.
    async fn list_containers(&self) -> DockercpResult<Vec<String>>;

    /// Open the archive of the request's source path inside its container.
    ///
    /// A 404 from the engine surfaces here as `PathNotFound`.
    async fn download(&self, request: &FetchRequest) -> DockercpResult<ArchiveStream>;
}

/// Choose a backend.
///
/// `probe` reports whether a backend is installed. An explicit `preferred`
/// choice must pass the probe; otherwise the first installed backend in
/// [`BackendKind::PRIORITY`] wins.
pub fn select_backend(
    preferred: Option<BackendKind>,
    probe: impl Fn(BackendKind) -> bool,
) -> DockercpResult<BackendKind> {
    if let Some(kind) = preferred {
        if probe(kind) {
            return Ok(kind);
        }
        return Err(DockercpError::Config(format!(
            "backend {} is not installed; build dockercp with the '{}' feature",
            kind, kind
        )));
    }

    BackendKind::PRIORITY
        .into_iter()
        .find(|kind| probe(*kind))
        .ok_or_else(|| {
            DockercpError::Config(
                "no usable backend installed; build dockercp with the 'engine-client' or 'local-socket' feature"
                    .to_string(),
            )
        })
}

/// Strip the leading separator the engine puts in front of container names.
pub(crate) fn primary_name(names: &[String]) -> Option<String> {
    names
        .first()
        .map(|name| name.strip_prefix('/').unwrap_or(name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_prefers_engine_client() {
        let kind = select_backend(None, |_| true).unwrap();
        assert_eq!(kind, BackendKind::EngineClient);

        let kind = select_backend(None, |k| k == BackendKind::LocalSocket).unwrap();
        assert_eq!(kind, BackendKind::LocalSocket);
    }

    #[test]
    fn test_nothing_installed() {
        let err = select_backend(None, |_| false).unwrap_err();
        assert!(matches!(err, DockercpError::Config(_)));
        assert!(err.to_string().contains("no usable backend installed"));
    }

    #[test]
    fn test_explicit_choice() {
        let kind = select_backend(Some(BackendKind::LocalSocket), |_| true).unwrap();
        assert_eq!(kind, BackendKind::LocalSocket);

        let err = select_backend(Some(BackendKind::EngineClient), |k| {
            k == BackendKind::LocalSocket
        })
        .unwrap_err();
        assert!(err.to_string().contains("engine-client"));
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in BackendKind::PRIORITY {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
        assert!("ssh".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_primary_name() {
        let names = vec!["/web1".to_string(), "/alias".to_string()];
        assert_eq!(primary_name(&names).as_deref(), Some("web1"));
        assert_eq!(primary_name(&["plain".to_string()]).as_deref(), Some("plain"));
        assert_eq!(primary_name(&[]), None);
    }
}
