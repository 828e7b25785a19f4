//! Storage location for partial and final artifacts.
//!
//! Every name owns exactly two paths in the download directory: the
//! partial file `<name>.tmp` that attempts write into, and the final file
//! `<name>` that only [`Storage::commit`] ever produces.

use crate::download::PARTIAL_SUFFIX;
use crate::error::{Error, Result};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the marker asking media scanners to skip the directory.
pub const SCAN_EXCLUSION_MARKER: &str = ".nomedia";

/// Download directory and the file layout inside it.
#[derive(Debug, Clone)]
pub struct Storage {
    directory: PathBuf,
    scan_exclusion_marker: bool,
}

impl Storage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            scan_exclusion_marker: false,
        }
    }

    /// Drop a [`SCAN_EXCLUSION_MARKER`] file when the directory is prepared.
    pub fn with_scan_exclusion_marker(self, enabled: bool) -> Self {
        Self {
            scan_exclusion_marker: enabled,
            ..self
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn partial_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}{}", name, PARTIAL_SUFFIX))
    }

    pub fn final_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Create the directory (and the marker, if enabled) when missing.
    pub async fn prepare(&self) -> Result<()> {
        debug!("Creating destination directory {:?}", self.directory);
        fs::create_dir_all(&self.directory).await?;

        if self.scan_exclusion_marker {
            let marker = self.directory.join(SCAN_EXCLUSION_MARKER);
            if !fs::try_exists(&marker).await? {
                fs::write(&marker, b"").await?;
            }
        }
        Ok(())
    }

    /// Bytes already present in the partial file, 0 when it does not exist.
    pub async fn partial_len(&self, name: &str) -> Result<u64> {
        file_len(&self.partial_path(name)).await
    }

    /// Length of the final file, or `None` when there is none.
    pub async fn artifact_len(&self, name: &str) -> Result<Option<u64>> {
        match fs::metadata(self.final_path(name)).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Promote the partial file to the final name.
    ///
    /// An older final file is removed first. Returns the committed size.
    pub async fn commit(&self, name: &str) -> Result<u64> {
        let partial = self.partial_path(name);
        let target = self.final_path(name);

        let size = match fs::metadata(&partial).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::MissingArtifact(partial));
            }
            Err(e) => return Err(e.into()),
        };

        remove_if_exists(&target).await?;
        fs::rename(&partial, &target).await?;
        debug!("Committed {:?} ({} bytes)", target, size);
        Ok(size)
    }

    /// Remove the final file of `name`. Missing files are not an error.
    pub async fn delete_artifact(&self, name: &str) -> Result<()> {
        remove_if_exists(&self.final_path(name)).await
    }
}

async fn file_len(path: &Path) -> Result<u64> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
