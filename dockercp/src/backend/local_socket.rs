//! Local-socket HTTP backend.
//!
//! Speaks the engine's HTTP API directly over its Unix control socket,
//! one HTTP/1.1 connection per request.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use dockercp_shared::EngineEndpoint;
use dockercp_shared::constants::engine::HTTP_HOST;
use dockercp_shared::errors::{DockercpError, DockercpResult};
use futures::StreamExt;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::header::HOST;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::UnixStream;

use crate::backend::registry::BackendRegistration;
use crate::backend::{ArchiveStream, BackendKind, EngineBackend, primary_name};
use crate::options::DockercpOptions;
use crate::request::FetchRequest;

/// Container descriptor as returned by `GET /containers/json`.
#[derive(Debug, Deserialize)]
struct ContainerDescriptor {
    #[serde(rename = "Names", default)]
    names: Vec<String>,
}

/// Error body the engine sends with non-success responses.
#[derive(Debug, Deserialize)]
struct EngineMessage {
    message: String,
}

/// A session bound to the engine's control socket.
#[derive(Debug, Clone)]
struct Session {
    socket_path: PathBuf,
}

impl Session {
    async fn get(&self, path_and_query: &str) -> DockercpResult<Response<Incoming>> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            DockercpError::Connection(format!(
                "failed to connect to {}: {}",
                self.socket_path.display(),
                e
            ))
        })?;

        let (mut sender, connection) =
            hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(TokioIo::new(stream))
                .await
                .map_err(|e| {
                    DockercpError::Connection(format!(
                        "HTTP handshake with {} failed: {}",
                        self.socket_path.display(),
                        e
                    ))
                })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Engine connection closed with error");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(path_and_query)
            .header(HOST, HTTP_HOST)
            .body(Empty::<Bytes>::new())
            .map_err(|e| {
                DockercpError::InvalidArgument(format!(
                    "invalid engine request {}: {}",
                    path_and_query, e
                ))
            })?;

        tracing::trace!(uri = path_and_query, "Sending engine request");
        sender
            .send_request(request)
            .await
            .map_err(|e| DockercpError::backend(format!("GET {} failed: {}", path_and_query, e)))
    }
}

/// Backend issuing raw HTTP requests to the engine's control socket.
pub struct LocalSocketBackend {
    endpoint: EngineEndpoint,
    session: Option<Session>,
}

impl LocalSocketBackend {
    pub fn new(options: &DockercpOptions) -> Self {
        Self {
            endpoint: options.resolved_endpoint(),
            session: None,
        }
    }

    fn session(&self) -> DockercpResult<&Session> {
        self.session.as_ref().ok_or_else(|| {
            DockercpError::Connection("local-socket backend is not connected".to_string())
        })
    }
}

#[async_trait]
impl EngineBackend for LocalSocketBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalSocket
    }

    async fn connect(&mut self) -> DockercpResult<()> {
        // Nothing is dialed yet; an unreachable socket shows up on the first request.
        tracing::debug!(endpoint = %self.endpoint, "Opening local-socket session");
        self.session = Some(Session {
            socket_path: self.endpoint.socket_path().to_path_buf(),
        });
        Ok(())
    }

    async fn list_containers(&self) -> DockercpResult<Vec<String>> {
        let response = self.session()?.get("/containers/json?all=1").await?;
        let status = response.status();
        let body = read_body(response).await?;

        if !status.is_success() {
            return Err(DockercpError::backend_status(
                status.as_u16(),
                format!(
                    "could not list containers, check that the engine is alive: {}",
                    engine_message(&body)
                ),
            ));
        }

        let descriptors: Vec<ContainerDescriptor> = serde_json::from_slice(&body).map_err(|e| {
            DockercpError::backend_status(
                status.as_u16(),
                format!("malformed container listing: {}", e),
            )
        })?;

        Ok(descriptors
            .iter()
            .filter_map(|descriptor| primary_name(&descriptor.names))
            .collect())
    }

    async fn download(&self, request: &FetchRequest) -> DockercpResult<ArchiveStream> {
        let uri = archive_uri(request.container(), request.source_path());
        let response = self.session()?.get(&uri).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            let body = read_body(response).await?;
            return Err(DockercpError::PathNotFound {
                container: request.container().to_string(),
                path: request.source_path().to_string(),
                detail: engine_message(&body),
            });
        }
        if !status.is_success() {
            let body = read_body(response).await?;
            return Err(DockercpError::backend_status(
                status.as_u16(),
                engine_message(&body),
            ));
        }

        let stream = response.into_body().into_data_stream().map(|frame| {
            frame.map_err(|e| DockercpError::backend(format!("archive stream interrupted: {}", e)))
        });
        Ok(Box::pin(stream))
    }
}

fn archive_uri(container: &str, path: &str) -> String {
    format!(
        "/containers/{}/archive?path={}",
        urlencoding::encode(container),
        urlencoding::encode(path)
    )
}

async fn read_body(response: Response<Incoming>) -> DockercpResult<Bytes> {
    Ok(response
        .into_body()
        .collect()
        .await
        .map_err(|e| DockercpError::backend(format!("failed to read engine response: {}", e)))?
        .to_bytes())
}

/// Pull the engine's `message` out of an error body, or fall back to raw text.
fn engine_message(body: &[u8]) -> String {
    serde_json::from_slice::<EngineMessage>(body)
        .map(|m| m.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string())
}

inventory::submit! {
    BackendRegistration {
        kind: BackendKind::LocalSocket,
        factory: |options| {
            Ok(Box::new(LocalSocketBackend::new(&options)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_uri_encodes_path() {
        assert_eq!(
            archive_uri("web1", "/etc/nginx/nginx.conf"),
            "/containers/web1/archive?path=%2Fetc%2Fnginx%2Fnginx.conf"
        );
        assert_eq!(
            archive_uri("web1", "/srv/my file&more"),
            "/containers/web1/archive?path=%2Fsrv%2Fmy%20file%26more"
        );
    }

    #[test]
    fn test_engine_message() {
        assert_eq!(
            engine_message(br#"{"message":"No such container: web9"}"#),
            "No such container: web9"
        );
        assert_eq!(engine_message(b"plain failure\n"), "plain failure");
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let options = DockercpOptions::default().with_endpoint(EngineEndpoint::unix("/nonexistent.sock"));
        let backend = LocalSocketBackend::new(&options);
        let err = backend.list_containers().await.unwrap_err();
        assert!(matches!(err, DockercpError::Connection(_)));
    }

    #[tokio::test]
    async fn test_unreachable_socket_fails_on_first_request() {
        let dir = tempfile::tempdir().unwrap();
        let options =
            DockercpOptions::default().with_endpoint(EngineEndpoint::unix(dir.path().join("absent.sock")));
        let mut backend = LocalSocketBackend::new(&options);

        // connect itself never fails
        backend.connect().await.unwrap();

        let err = backend.list_containers().await.unwrap_err();
        assert!(matches!(err, DockercpError::Connection(_)));
        assert!(err.to_string().contains("absent.sock"));
    }
}
