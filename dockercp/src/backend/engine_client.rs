//! Direct engine-client backend built on `bollard`.

use async_trait::async_trait;
use bollard::container::{DownloadFromContainerOptions, ListContainersOptions};
use bollard::errors::Error as BollardError;
use bollard::{API_DEFAULT_VERSION, Docker};
use dockercp_shared::EngineEndpoint;
use dockercp_shared::errors::{DockercpError, DockercpResult};
use futures::StreamExt;

use crate::backend::registry::BackendRegistration;
use crate::backend::{ArchiveStream, BackendKind, EngineBackend, primary_name};
use crate::options::DockercpOptions;
use crate::request::FetchRequest;

/// Request timeout handed to bollard; matches its own default.
const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Backend using the structured engine client.
pub struct EngineClientBackend {
    /// Explicit endpoint; `None` uses bollard's local defaults.
    endpoint: Option<EngineEndpoint>,
    docker: Option<Docker>,
}

impl EngineClientBackend {
    pub fn new(options: &DockercpOptions) -> Self {
        Self {
            endpoint: options.endpoint.clone(),
            docker: None,
        }
    }

    fn docker(&self) -> DockercpResult<&Docker> {
        self.docker.as_ref().ok_or_else(|| {
            DockercpError::Connection("engine-client backend is not connected".to_string())
        })
    }

    fn describe_endpoint(&self) -> String {
        self.endpoint
            .as_ref()
            .map(|e| e.to_uri())
            .unwrap_or_else(|| "local defaults".to_string())
    }
}

#[async_trait]
impl EngineBackend for EngineClientBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::EngineClient
    }

    async fn connect(&mut self) -> DockercpResult<()> {
        let docker = match &self.endpoint {
            Some(endpoint) => Docker::connect_with_unix(
                &endpoint.socket_path().to_string_lossy(),
                CLIENT_TIMEOUT_SECS,
                API_DEFAULT_VERSION,
            ),
            None => Docker::connect_with_local_defaults(),
        }
        .map_err(|e| {
            DockercpError::Connection(format!(
                "failed to create engine client for {}: {}",
                self.describe_endpoint(),
                e
            ))
        })?;

        // Client construction is lazy; ping to prove an engine is listening.
        docker.ping().await.map_err(|e| {
            DockercpError::Connection(format!(
                "engine at {} is not reachable: {}",
                self.describe_endpoint(),
                e
            ))
        })?;

        tracing::debug!(endpoint = %self.describe_endpoint(), "Engine client connected");
        self.docker = Some(docker);
        Ok(())
    }

    async fn list_containers(&self) -> DockercpResult<Vec<String>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let summaries = self
            .docker()?
            .list_containers(Some(options))
            .await
            .map_err(|e| map_api_error(e, "could not list containers"))?;

        Ok(summaries
            .iter()
            .filter_map(|summary| summary.names.as_deref().and_then(primary_name))
            .collect())
    }

    async fn download(&self, request: &FetchRequest) -> DockercpResult<ArchiveStream> {
        let docker = self.docker()?.clone();
        let container = request.container().to_string();
        let path = request.source_path().to_string();

        let mut stream: ArchiveStream = Box::pin(async_stream::stream! {
            let options = DownloadFromContainerOptions { path: path.clone() };
            let mut chunks = Box::pin(docker.download_from_container(&container, Some(options)));
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(bytes) => {
                        yield Ok(bytes);
                    }
                    Err(e) => {
                        yield Err(map_download_error(e, &container, &path));
                        return;
                    }
                }
            }
        });

        // bollard reports a rejected request as the first stream item; pull
        // it now so not-found surfaces from download() itself.
        let first = stream.next().await.transpose()?;
        Ok(Box::pin(futures::stream::iter(first.map(Ok)).chain(stream)))
    }
}

fn map_download_error(error: BollardError, container: &str, path: &str) -> DockercpError {
    match error {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => DockercpError::PathNotFound {
            container: container.to_string(),
            path: path.to_string(),
            detail: message,
        },
        other => map_api_error(other, "archive request failed"),
    }
}

fn map_api_error(error: BollardError, context: &str) -> DockercpError {
    match error {
        BollardError::DockerResponseServerError {
            status_code,
            message,
        } => DockercpError::backend_status(status_code, format!("{}: {}", context, message)),
        other => DockercpError::backend(format!("{}: {}", context, other)),
    }
}

inventory::submit! {
    BackendRegistration {
        kind: BackendKind::EngineClient,
        factory: |options| {
            Ok(Box::new(EngineClientBackend::new(&options)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_maps_to_path_not_found() {
        let err = map_download_error(
            BollardError::DockerResponseServerError {
                status_code: 404,
                message: "Could not find the file /nope in container web1".to_string(),
            },
            "web1",
            "/nope",
        );
        match err {
            DockercpError::PathNotFound {
                container, path, ..
            } => {
                assert_eq!(container, "web1");
                assert_eq!(path, "/nope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_status_maps_to_backend() {
        let err = map_download_error(
            BollardError::DockerResponseServerError {
                status_code: 500,
                message: "boom".to_string(),
            },
            "web1",
            "/etc",
        );
        assert!(matches!(
            err,
            DockercpError::Backend {
                status: Some(500),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let backend = EngineClientBackend::new(&DockercpOptions::default());
        let err = backend.list_containers().await.unwrap_err();
        assert!(matches!(err, DockercpError::Connection(_)));
    }

    #[tokio::test]
    async fn test_connect_fails_without_engine() {
        let dir = tempfile::tempdir().unwrap();
        let options = DockercpOptions::default()
            .with_endpoint(EngineEndpoint::unix(dir.path().join("absent.sock")));
        let mut backend = EngineClientBackend::new(&options);

        let err = backend.connect().await.unwrap_err();
        assert!(matches!(err, DockercpError::Connection(_)));
    }
}
