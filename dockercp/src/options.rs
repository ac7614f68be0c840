//! Configuration for dockercp.

use std::path::PathBuf;

use dockercp_shared::EngineEndpoint;
use dockercp_shared::constants::envs;
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// Options passed into backend construction.
///
/// Every field defaults to the local environment, and each can be
/// overridden so tests and callers can point at a different engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DockercpOptions {
    /// Engine control socket.
    ///
    /// `None` means local defaults: `DOCKER_HOST` when it holds a
    /// `unix://` URI, otherwise `/var/run/docker.sock`.
    #[serde(default)]
    pub endpoint: Option<EngineEndpoint>,

    /// Explicit backend choice. `None` probes in priority order.
    #[serde(default)]
    pub backend: Option<BackendKind>,

    /// Directory for the temporary archive file.
    ///
    /// Default: the system temp directory
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl DockercpOptions {
    pub fn with_endpoint(mut self, endpoint: EngineEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Endpoint to use, falling back to the local defaults.
    pub fn resolved_endpoint(&self) -> EngineEndpoint {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => EngineEndpoint::local_default(std::env::var(envs::DOCKER_HOST).ok().as_deref()),
        }
    }

    /// Directory the temporary archive is created in.
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
