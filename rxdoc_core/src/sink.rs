//! Document sinks.
//!
//! A sink receives the serialized bytes of a rendered prescription together
//! with its suggested file name. The file sink writes through a locked
//! temporary file and renames it into place, so a reader never observes a
//! partially written document.

use crate::{Error, Result};
use fs2::FileExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Destination for rendered documents
pub trait DocumentSink {
    /// Store the bytes, returning where they ended up
    fn write(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf>;
}

/// Writes documents into a directory
pub struct FileSink {
    dir: PathBuf,
    overwrite: bool,
}

impl FileSink {
    /// A sink that never replaces existing files
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the next write of `filename` would land on
    ///
    /// Without overwrite, an existing `name.pdf` yields `name_2.pdf`, then
    /// `name_3.pdf` and so on.
    pub fn target_path(&self, filename: &str) -> PathBuf {
        let path = self.dir.join(filename);
        if self.overwrite || !path.exists() {
            return path;
        }

        let (stem, extension) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };

        (2u32..)
            .map(|n| match extension {
                Some(ext) => self.dir.join(format!("{}_{}.{}", stem, n, ext)),
                None => self.dir.join(format!("{}_{}", stem, n)),
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(bytes)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        if self.overwrite {
            temp.persist(path).map_err(|e| e.error)?;
        } else {
            temp.persist_noclobber(path).map_err(|e| e.error)?;
        }
        Ok(())
    }
}

impl DocumentSink for FileSink {
    fn write(&mut self, bytes: &[u8], filename: &str) -> Result<PathBuf> {
        let path = self.dir.join(filename);
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(Error::SinkWriteFailure {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file name must not contain path separators",
                ),
            });
        }

        let path = self.target_path(filename);
        self.write_atomic(&path, bytes)
            .map_err(|source| Error::SinkWriteFailure {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }
}
