//! Fetch request: what to copy, from where, to where.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use dockercp_shared::errors::{DockercpError, DockercpResult};

/// An immutable description of one copy out of a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    container: String,
    source_path: String,
    destination: PathBuf,
    buffer_len: NonZeroUsize,
}

impl FetchRequest {
    /// Create a request, rejecting empty identifiers and a zero buffer length.
    pub fn new(
        container: impl Into<String>,
        source_path: impl Into<String>,
        destination: impl Into<PathBuf>,
        buffer_len: usize,
    ) -> DockercpResult<Self> {
        let container = container.into();
        let source_path = source_path.into();

        if container.is_empty() {
            return Err(DockercpError::InvalidArgument(
                "container name must not be empty".to_string(),
            ));
        }
        if source_path.is_empty() {
            return Err(DockercpError::InvalidArgument(
                "source path must not be empty".to_string(),
            ));
        }
        let buffer_len = NonZeroUsize::new(buffer_len).ok_or_else(|| {
            DockercpError::InvalidArgument("buffer size must be at least 1 byte".to_string())
        })?;

        Ok(Self {
            container,
            source_path,
            destination: destination.into(),
            buffer_len,
        })
    }

    /// Create a request from a `CONTAINER:PATH` source string.
    pub fn from_source(
        source: &str,
        destination: impl Into<PathBuf>,
        buffer_len: usize,
    ) -> DockercpResult<Self> {
        let (container, path) = split_source(source)?;
        Self::new(container, path, destination, buffer_len)
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn buffer_len(&self) -> NonZeroUsize {
        self.buffer_len
    }
}

/// Split `CONTAINER:PATH` at the first colon.
///
/// Container names cannot contain a colon, so anything after the first one
/// belongs to the path.
pub fn split_source(source: &str) -> DockercpResult<(&str, &str)> {
    match source.split_once(':') {
        Some((container, path)) if !container.is_empty() && !path.is_empty() => {
            Ok((container, path))
        }
        _ => Err(DockercpError::InvalidArgument(format!(
            "invalid source '{}', expected CONTAINER:PATH",
            source
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_fields() {
        let request = FetchRequest::new("web1", "/etc/nginx/nginx.conf", "/tmp/out", 4096).unwrap();
        assert_eq!(request.container(), "web1");
        assert_eq!(request.source_path(), "/etc/nginx/nginx.conf");
        assert_eq!(request.destination(), Path::new("/tmp/out"));
        assert_eq!(request.buffer_len().get(), 4096);

        assert!(FetchRequest::new("", "/etc", "/tmp/out", 1).is_err());
        assert!(FetchRequest::new("web1", "", "/tmp/out", 1).is_err());

        let err = FetchRequest::new("web1", "/etc", "/tmp/out", 0).unwrap_err();
        assert!(err.to_string().contains("buffer size"));
    }

    #[test]
    fn test_split_source() {
        assert_eq!(split_source("web1:/etc/hosts").unwrap(), ("web1", "/etc/hosts"));
        // Only the first colon separates container from path
        assert_eq!(
            split_source("web1:/opt/a:b").unwrap(),
            ("web1", "/opt/a:b")
        );

        for bad in ["web1", ":/etc", "web1:", ""] {
            assert!(
                matches!(split_source(bad), Err(DockercpError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_source() {
        let request = FetchRequest::from_source("db:/var/lib/data", "out", 1).unwrap();
        assert_eq!(request.container(), "db");
        assert_eq!(request.source_path(), "/var/lib/data");
    }
}
