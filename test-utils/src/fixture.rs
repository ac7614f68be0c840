//! Tar archive fixtures shaped like engine archive responses.

use tar::{Builder, EntryType, Header};

/// Fixed mtime so fixtures are byte-for-byte reproducible.
const FIXTURE_MTIME: u64 = 1_700_000_000;

enum FixtureEntry {
    Dir(String),
    File(String, Vec<u8>),
}

/// Builds an uncompressed tar archive in memory.
#[derive(Default)]
pub struct TarFixture {
    entries: Vec<FixtureEntry>,
}

impl TarFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry (`path` without trailing slash).
    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(path.to_string()));
        self
    }

    /// Add a regular file entry.
    pub fn file(mut self, path: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries
            .push(FixtureEntry::File(path.to_string(), contents.as_ref().to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());

        for entry in self.entries {
            let mut header = Header::new_gnu();
            header.set_mtime(FIXTURE_MTIME);
            match entry {
                FixtureEntry::Dir(path) => {
                    header.set_entry_type(EntryType::Directory);
                    header.set_mode(0o755);
                    header.set_size(0);
                    builder
                        .append_data(&mut header, format!("{}/", path), std::io::empty())
                        .expect("append fixture directory");
                }
                FixtureEntry::File(path, contents) => {
                    header.set_entry_type(EntryType::Regular);
                    header.set_mode(0o644);
                    header.set_size(contents.len() as u64);
                    builder
                        .append_data(&mut header, path, contents.as_slice())
                        .expect("append fixture file");
                }
            }
        }

        builder.into_inner().expect("finish fixture archive")
    }
}
