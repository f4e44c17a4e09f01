//! Scoped temporary image files
//!
//! A [`TemporaryImageResource`] owns one normalized JPEG on disk. The file is
//! created with a random, exclusively-opened name and is deleted exactly once:
//! by [`TemporaryImageResource::release`], or by `Drop` on any path that never
//! reached it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const NAME_PREFIX: &str = "pipeline-image-";
const NAME_SUFFIX: &str = ".jpg";

/// Exclusively-owned temporary image file
#[derive(Debug)]
pub struct TemporaryImageResource {
    file: NamedTempFile,
    source_url: Option<String>,
}

impl TemporaryImageResource {
    /// Write `jpeg` to a fresh uniquely named file inside `dir`
    pub fn create(dir: &Path, jpeg: &[u8]) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix(NAME_PREFIX)
            .suffix(NAME_SUFFIX)
            .tempfile_in(dir)?;
        file.write_all(jpeg)?;
        file.flush()?;

        Ok(Self {
            file,
            source_url: None,
        })
    }

    pub(crate) fn with_source(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// URL the image was downloaded from, if any
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.file.path())
    }

    /// Delete the file now and surface any I/O error
    pub fn release(self) -> io::Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        tracing::debug!("Released temporary image {}", path.display());
        Ok(())
    }

    /// Move the image out of the temporary namespace to `target`.
    ///
    /// Falls back to copy-then-delete when the work directory and `target`
    /// live on different filesystems.
    pub fn persist(self, target: &Path) -> io::Result<PathBuf> {
        match self.file.persist(target) {
            Ok(_) => Ok(target.to_path_buf()),
            Err(e) if e.error.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!(
                    "Rename to {} crosses devices, copying instead",
                    target.display()
                );
                copy_out(e.file, target)
            }
            Err(e) => Err(e.error),
        }
    }
}

/// Copy the temporary file to `target`, then delete the original
fn copy_out(file: NamedTempFile, target: &Path) -> io::Result<PathBuf> {
    std::fs::copy(file.path(), target)?;
    file.close()?;
    Ok(target.to_path_buf())
}
