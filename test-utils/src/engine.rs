//! Mock container engine serving the HTTP API on a Unix socket.
//!
//! Runs on its own thread with its own runtime, so it works from both
//! plain `#[test]` functions and `#[tokio::test]` functions, and keeps
//! serving while a test blocks on a spawned CLI process.

use std::collections::HashMap;
use std::convert::Infallible;
use std::os::unix::net::UnixListener as StdUnixListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::sync::oneshot;

type MockBody = BoxBody<Bytes, Infallible>;

struct MockContainer {
    name: String,
    running: bool,
}

#[derive(Default)]
struct EngineState {
    containers: Vec<MockContainer>,
    /// Listed, but gone by the time an archive is requested.
    ghosts: Vec<String>,
    archives: HashMap<(String, String), Bytes>,
    listing_status: Option<u16>,
    archive_status: Option<u16>,
    frame_len: usize,
    requests: Mutex<Vec<String>>,
}

/// Configures a [`MockEngine`] before it starts listening.
pub struct MockEngineBuilder {
    state: EngineState,
}

impl MockEngineBuilder {
    /// Add a container; stopped ones only show up in "all" listings.
    pub fn container(mut self, name: &str, running: bool) -> Self {
        self.state.containers.push(MockContainer {
            name: name.to_string(),
            running,
        });
        self
    }

    /// Add a container that is listed but removed before any archive request.
    pub fn ghost_container(mut self, name: &str) -> Self {
        self.state.ghosts.push(name.to_string());
        self
    }

    /// Serve `archive` for `path` inside `container`.
    pub fn archive(mut self, container: &str, path: &str, archive: impl Into<Vec<u8>>) -> Self {
        self.state.archives.insert(
            (container.to_string(), path.to_string()),
            Bytes::from(archive.into()),
        );
        self
    }

    /// Answer container listings with `status`.
    pub fn fail_listing(mut self, status: u16) -> Self {
        self.state.listing_status = Some(status);
        self
    }

    /// Answer every archive request with `status`.
    pub fn fail_archive(mut self, status: u16) -> Self {
        self.state.archive_status = Some(status);
        self
    }

    /// Size of the HTTP body frames archives are sent in.
    pub fn frame_len(mut self, frame_len: usize) -> Self {
        self.state.frame_len = frame_len.max(1);
        self
    }

    pub fn start(self) -> MockEngine {
        let dir = tempfile::Builder::new()
            .prefix("dcp-engine")
            .tempdir()
            .expect("create mock engine directory");
        let socket_path = dir.path().join("engine.sock");

        // Bind before returning so clients never race the listener.
        let listener = StdUnixListener::bind(&socket_path).expect("bind mock engine socket");
        listener
            .set_nonblocking(true)
            .expect("set mock engine socket non-blocking");

        let state = Arc::new(self.state);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server_state = state.clone();
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build mock engine runtime");
            runtime.block_on(serve(listener, server_state, shutdown_rx));
        });

        MockEngine {
            _dir: dir,
            socket_path,
            state,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }
}

/// A running mock engine. Stops when dropped.
pub struct MockEngine {
    _dir: TempDir,
    socket_path: PathBuf,
    state: Arc<EngineState>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MockEngine {
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder {
            state: EngineState {
                frame_len: 1024,
                ..Default::default()
            },
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// `unix://` URI of the engine socket.
    pub fn uri(&self) -> String {
        format!("unix://{}", self.socket_path.display())
    }

    /// Every request seen so far, as `path?query` with any API version prefix removed.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().clone()
    }

    /// Number of archive requests seen so far.
    pub fn archive_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.contains("/archive"))
            .count()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

async fn serve(
    listener: StdUnixListener,
    state: Arc<EngineState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let listener = UnixListener::from_std(listener).expect("register mock engine socket");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => {
                let Ok((stream, _)) = accepted else { continue };
                let state = state.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |request: Request<Incoming>| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(handle(&state, request)) }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        }
    }
}

fn handle(state: &EngineState, request: Request<Incoming>) -> Response<MockBody> {
    let route = strip_version(request.uri().path()).to_string();
    let query = request.uri().query().unwrap_or_default().to_string();

    state.requests.lock().push(if query.is_empty() {
        route.clone()
    } else {
        format!("{}?{}", route, query)
    });

    if route == "/_ping" {
        return respond(StatusCode::OK, "text/plain", Full::new(Bytes::from_static(b"OK")).boxed());
    }
    if route == "/containers/json" {
        return list_containers(state, &query);
    }
    if let Some(name) = route
        .strip_prefix("/containers/")
        .and_then(|rest| rest.strip_suffix("/archive"))
    {
        return archive(state, &decode(name), &query);
    }

    error(StatusCode::NOT_FOUND, "page not found")
}

fn list_containers(state: &EngineState, query: &str) -> Response<MockBody> {
    if let Some(status) = state.listing_status {
        return error(status_code(status), "mock listing failure");
    }

    let all = matches!(query_param(query, "all").as_deref(), Some("1" | "true"));
    let mut listed: Vec<(&str, bool)> = state
        .containers
        .iter()
        .filter(|c| all || c.running)
        .map(|c| (c.name.as_str(), c.running))
        .collect();
    listed.extend(state.ghosts.iter().map(|name| (name.as_str(), true)));

    let summaries: Vec<serde_json::Value> = listed
        .iter()
        .enumerate()
        .map(|(index, (name, running))| {
            serde_json::json!({
                "Id": format!("{:064x}", index + 1),
                "Names": [format!("/{}", name)],
                "Image": "mock:latest",
                "State": if *running { "running" } else { "exited" },
                "Status": if *running { "Up 5 minutes" } else { "Exited (0) 5 minutes ago" },
            })
        })
        .collect();

    let body = serde_json::to_vec(&summaries).expect("serialize container listing");
    respond(StatusCode::OK, "application/json", Full::new(Bytes::from(body)).boxed())
}

fn archive(state: &EngineState, container: &str, query: &str) -> Response<MockBody> {
    if let Some(status) = state.archive_status {
        return error(status_code(status), "mock archive failure");
    }
    if !state.containers.iter().any(|c| c.name == container) {
        return error(
            StatusCode::NOT_FOUND,
            &format!("No such container: {}", container),
        );
    }
    let Some(path) = query_param(query, "path") else {
        return error(StatusCode::BAD_REQUEST, "bad parameter: path is required");
    };

    match state.archives.get(&(container.to_string(), path.clone())) {
        Some(data) => {
            let frames: Vec<Result<Frame<Bytes>, Infallible>> = data
                .chunks(state.frame_len)
                .map(|chunk| Ok(Frame::data(Bytes::copy_from_slice(chunk))))
                .collect();
            let body = StreamBody::new(futures::stream::iter(frames)).boxed();
            respond(StatusCode::OK, "application/x-tar", body)
        }
        None => error(
            StatusCode::NOT_FOUND,
            &format!("Could not find the file {} in container {}", path, container),
        ),
    }
}

fn respond(status: StatusCode, content_type: &str, body: MockBody) -> Response<MockBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .expect("build mock response")
}

fn error(status: StatusCode, message: &str) -> Response<MockBody> {
    let body = serde_json::to_vec(&serde_json::json!({ "message": message }))
        .expect("serialize error message");
    respond(status, "application/json", Full::new(Bytes::from(body)).boxed())
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Drop a leading `/v1.47`-style API version segment.
fn strip_version(path: &str) -> &str {
    if let Some(rest) = path.strip_prefix("/v") {
        if let Some((version, _)) = rest.split_once('/') {
            if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.') {
                return &path[version.len() + 2..];
            }
        }
    }
    path
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, value)| decode(value))
}

fn decode(value: &str) -> String {
    let value = value.replace('+', " ");
    urlencoding::decode(&value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.clone())
}
