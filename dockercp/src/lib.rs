//! dockercp - copy a file or directory out of a container onto the host.
//!
//! The pipeline is: select a transport backend, connect to the engine,
//! check that the container exists, stream its archive of the requested
//! path into a temporary file, then unpack that archive into the
//! destination directory.
//!
//! ```rust,no_run
//! use dockercp::{DockerCp, DockercpOptions, FetchRequest};
//!
//! # async fn run() -> dockercp::DockercpResult<()> {
//! let request = FetchRequest::new("web1", "/etc/nginx/nginx.conf", "/tmp/out", 4096)?;
//! let mut client = DockerCp::new(DockercpOptions::default())?;
//! let summary = client.fetch(&request).await?;
//! println!("extracted {} entries", summary.entries_extracted);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod backend;
pub mod fetch;
pub mod options;
pub mod request;

pub use backend::{ArchiveStream, BackendKind, EngineBackend};
pub use dockercp_shared::{DockercpError, DockercpResult, EngineEndpoint, constants};
pub use fetch::{DockerCp, FetchStage, FetchSummary};
pub use options::DockercpOptions;
pub use request::FetchRequest;
