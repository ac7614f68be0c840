//! Persist an archive stream to a temporary file, then unpack it.

use std::fs::{self, File};
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use dockercp_shared::constants::fetch::{TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX};
use dockercp_shared::errors::{DockercpError, DockercpResult};
use futures::StreamExt;
use tar::Archive;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::backend::ArchiveStream;

const UNREADABLE: &str = "could not read fetched archive";

/// Outcome of a successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    /// Tar entries unpacked into the destination.
    pub entries: usize,
    /// Size of the archive that was unpacked.
    pub archive_bytes: u64,
}

/// Writes archive streams into uniquely named files under `temp_dir`.
#[derive(Debug, Clone)]
pub struct Materializer {
    temp_dir: PathBuf,
}

impl Materializer {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// Write every chunk of `stream`, in order, to a fresh temporary file.
    ///
    /// The file belongs to the returned [`PersistedArchive`]; if anything
    /// fails before that, the partial file is removed on drop. A stream that
    /// breaks off partway is an `Archive` error: what reached the file is
    /// not a complete archive.
    pub async fn persist(&self, mut stream: ArchiveStream) -> DockercpResult<PersistedArchive> {
        let file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(TEMP_FILE_SUFFIX)
            .tempfile_in(&self.temp_dir)
            .map_err(|e| {
                DockercpError::Archive(format!(
                    "failed to create temporary file in {}: {}",
                    self.temp_dir.display(),
                    e
                ))
            })?;
        debug!(path = %file.path().display(), "Created temporary archive file");

        let handle = file
            .as_file()
            .try_clone()
            .map_err(|e| write_error(file.path(), e))?;
        let mut writer = tokio::fs::File::from_std(handle);

        let mut bytes_written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(bytes = bytes_written, error = %e, "Archive stream interrupted");
                DockercpError::Archive(format!(
                    "{}: archive stream interrupted after {} bytes: {}",
                    UNREADABLE, bytes_written, e
                ))
            })?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| write_error(file.path(), e))?;
            bytes_written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| write_error(file.path(), e))?;

        debug!(
            path = %file.path().display(),
            bytes = bytes_written,
            "Archive stream persisted"
        );
        Ok(PersistedArchive {
            file,
            bytes_written,
        })
    }

    /// Persist `stream` and unpack it into `destination`.
    pub async fn persist_and_extract(
        &self,
        stream: ArchiveStream,
        destination: &Path,
    ) -> DockercpResult<ExtractReport> {
        self.persist(stream).await?.extract(destination)
    }
}

/// A fully written temporary tar file awaiting extraction.
#[derive(Debug)]
pub struct PersistedArchive {
    file: NamedTempFile,
    bytes_written: u64,
}

impl PersistedArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Unpack into `destination`, then delete the temporary file.
    ///
    /// The whole archive is walked once before anything is written, so an
    /// unreadable archive leaves `destination` untouched (not even created).
    /// Existing files at the same relative path are overwritten. If the
    /// temporary file cannot be deleted afterwards an `Archive` error is
    /// returned, but the extracted data stays in place.
    pub fn extract(self, destination: &Path) -> DockercpResult<ExtractReport> {
        let entries = self.validate()?;

        fs::create_dir_all(destination).map_err(|e| {
            DockercpError::Archive(format!(
                "failed to create destination directory {}: {}",
                destination.display(),
                e
            ))
        })?;

        let mut archive = Archive::new(BufReader::new(self.rewound()?));
        archive.set_overwrite(true);
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.unpack(destination).map_err(|e| {
            DockercpError::Archive(format!(
                "failed to extract into {}: {}",
                destination.display(),
                e
            ))
        })?;
        debug!(
            destination = %destination.display(),
            entries,
            "Archive extracted"
        );

        let report = ExtractReport {
            entries,
            archive_bytes: self.bytes_written,
        };

        let temp_path = self.file.path().to_path_buf();
        self.file.close().map_err(|e| {
            warn!(path = %temp_path.display(), error = %e, "Temporary archive left behind");
            DockercpError::Archive(format!(
                "could not delete temporary file {}; remove manually: {}",
                temp_path.display(),
                e
            ))
        })?;

        Ok(report)
    }

    /// Walk every header without unpacking; returns the entry count.
    fn validate(&self) -> DockercpResult<usize> {
        let mut archive = Archive::new(BufReader::new(self.rewound()?));
        let mut count = 0;
        for entry in archive.entries().map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            entry.path().map_err(unreadable)?;
            count += 1;
        }

        if count == 0 {
            return Err(DockercpError::Archive(format!(
                "{}: archive is empty",
                UNREADABLE
            )));
        }
        Ok(count)
    }

    /// An independent handle positioned at the start of the file.
    fn rewound(&self) -> DockercpResult<File> {
        let mut file = self.file.as_file().try_clone().map_err(unreadable)?;
        file.seek(SeekFrom::Start(0)).map_err(unreadable)?;
        Ok(file)
    }
}

fn unreadable(error: io::Error) -> DockercpError {
    DockercpError::Archive(format!("{}: {}", UNREADABLE, error))
}

fn write_error(path: &Path, error: io::Error) -> DockercpError {
    DockercpError::Archive(format!(
        "failed to write temporary file {}: {}",
        path.display(),
        error
    ))
}
