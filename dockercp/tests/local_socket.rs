//! Wire-level behavior of the local-socket backend.
#![cfg(feature = "local-socket")]

use dockercp::backend::EngineBackend;
use dockercp::backend::local_socket::LocalSocketBackend;
use dockercp::{DockercpOptions, EngineEndpoint, FetchRequest};
use dockercp_test_utils::{MockEngine, TarFixture};
use futures::TryStreamExt;

#[tokio::test]
async fn test_requests_hit_documented_endpoints() {
    let archive = TarFixture::new().file("my file.txt", b"spaces").build();
    let engine = MockEngine::builder()
        .container("web1", true)
        .archive("web1", "/srv/my file.txt", archive.clone())
        .frame_len(64)
        .start();

    let options = DockercpOptions::default().with_endpoint(EngineEndpoint::unix(engine.socket_path()));
    let mut backend = LocalSocketBackend::new(&options);
    backend.connect().await.unwrap();

    assert_eq!(backend.list_containers().await.unwrap(), vec!["web1"]);

    let request = FetchRequest::new("web1", "/srv/my file.txt", "/unused", 4096).unwrap();
    let stream = backend.download(&request).await.unwrap();
    let frames: Vec<bytes::Bytes> = stream.try_collect().await.unwrap();
    assert_eq!(frames.concat(), archive);

    assert_eq!(
        engine.requests(),
        vec![
            "/containers/json?all=1".to_string(),
            "/containers/web1/archive?path=%2Fsrv%2Fmy%20file.txt".to_string(),
        ]
    );
}
