//! Fetch orchestration: the `DockerCp` facade.
//!
//! A fetch walks a fixed sequence of stages, each one an explicit call on
//! the selected backend:
//!
//! ```text
//! Uninitialized → BackendSelected → Connected → Validated
//!               → Downloaded → Extracted → Done
//! ```
//!
//! Any failure moves straight to `Failed(reason)` and the error is returned
//! unchanged. There is no retry and no partial-fetch state to resume.

use std::path::PathBuf;

use dockercp_shared::errors::{DockercpError, DockercpResult};
use tracing::{debug, info};

use crate::archive::{Materializer, chunked};
use crate::backend::{self, BackendKind, EngineBackend, registry};
use crate::options::DockercpOptions;
use crate::request::FetchRequest;

/// Where a fetch currently stands.
///
/// `Uninitialized → BackendSelected` happens inside [`DockerCp::new`]: a
/// client that exists has a backend, and a failed selection returns the
/// error instead of a client, so no client is ever observed `Uninitialized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStage {
    Uninitialized,
    BackendSelected,
    Connected,
    Validated,
    Downloaded,
    Extracted,
    Done,
    Failed(String),
}

impl FetchStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchStage::Done | FetchStage::Failed(_))
    }
}

/// What a successful fetch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    pub backend: BackendKind,
    pub bytes_downloaded: u64,
    pub entries_extracted: usize,
    pub destination: PathBuf,
}

/// Copies paths out of containers through one selected backend.
pub struct DockerCp {
    backend: Box<dyn EngineBackend>,
    options: DockercpOptions,
    stage: FetchStage,
    connected: bool,
}

impl DockerCp {
    /// Select and create a backend, probing the compiled-in registry.
    pub fn new(options: DockercpOptions) -> DockercpResult<Self> {
        Self::with_probe(options, registry::is_registered)
    }

    /// Select and create a backend using a caller-supplied capability probe.
    pub fn with_probe(
        options: DockercpOptions,
        probe: impl Fn(BackendKind) -> bool,
    ) -> DockercpResult<Self> {
        let kind = backend::select_backend(options.backend, probe)?;
        let backend = registry::create_backend(kind, options.clone())?;
        Ok(Self::with_backend(backend, options))
    }

    /// Wrap an already constructed backend.
    pub fn with_backend(backend: Box<dyn EngineBackend>, options: DockercpOptions) -> Self {
        debug!(backend = %backend.kind(), "Backend selected");
        Self {
            backend,
            options,
            stage: FetchStage::BackendSelected,
            connected: false,
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Last stage reached by the most recent fetch.
    pub fn stage(&self) -> &FetchStage {
        &self.stage
    }

    /// Names of all containers known to the engine, stopped ones included.
    pub async fn list_containers(&mut self) -> DockercpResult<Vec<String>> {
        self.ensure_connected().await?;
        self.backend.list_containers().await
    }

    /// Copy `request.source_path()` out of `request.container()` into
    /// `request.destination()`.
    ///
    /// The container must appear in the engine's listing before any archive
    /// is requested. The listing and the archive request are separate engine
    /// calls, so a container removed in between surfaces as a not-found error
    /// from the download.
    pub async fn fetch(&mut self, request: &FetchRequest) -> DockercpResult<FetchSummary> {
        self.stage = FetchStage::BackendSelected;

        let result = self.run(request).await;
        if let Err(e) = &result {
            self.transition(FetchStage::Failed(e.to_string()));
        }
        result
    }

    async fn run(&mut self, request: &FetchRequest) -> DockercpResult<FetchSummary> {
        let kind = self.backend.kind();
        info!(
            container = request.container(),
            path = request.source_path(),
            buffer_len = request.buffer_len().get(),
            backend = %kind,
            "Fetching from container"
        );

        self.ensure_connected().await?;
        self.transition(FetchStage::Connected);

        let containers = self.backend.list_containers().await?;
        if !containers.iter().any(|name| name == request.container()) {
            return Err(DockercpError::ContainerNotFound(
                request.container().to_string(),
            ));
        }
        self.transition(FetchStage::Validated);

        let stream = self.backend.download(request).await?;
        let materializer = Materializer::new(self.options.resolved_temp_dir());
        let archive = materializer
            .persist(chunked(stream, request.buffer_len()))
            .await?;
        let bytes_downloaded = archive.bytes_written();
        self.transition(FetchStage::Downloaded);

        let report = archive.extract(request.destination())?;
        self.transition(FetchStage::Extracted);

        info!(
            container = request.container(),
            destination = %request.destination().display(),
            entries = report.entries,
            bytes = bytes_downloaded,
            "Fetch complete"
        );
        self.transition(FetchStage::Done);

        Ok(FetchSummary {
            backend: kind,
            bytes_downloaded,
            entries_extracted: report.entries,
            destination: request.destination().to_path_buf(),
        })
    }

    async fn ensure_connected(&mut self) -> DockercpResult<()> {
        if !self.connected {
            self.backend.connect().await?;
            self.connected = true;
        }
        Ok(())
    }

    fn transition(&mut self, next: FetchStage) {
        debug!(from = ?self.stage, to = ?next, "Fetch stage transition");
        self.stage = next;
    }
}
