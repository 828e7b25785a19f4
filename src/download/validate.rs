//! Integrity checks on responses and completed transfers.

use crate::error::{Error, Result};

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::warn;

/// Media types that mark an error page rather than an artifact.
const ERROR_PAGE_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Reject a response whose content type says it is an HTML page.
///
/// Captive portals and error pages often answer `200 OK` with HTML; the
/// body must not be consumed in that case.
pub fn reject_error_page(content_type: Option<&str>) -> Result<()> {
    let Some(content_type) = content_type else {
        return Ok(());
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if ERROR_PAGE_TYPES.contains(&essence.as_str()) {
        return Err(Error::ContentType(content_type.to_string()));
    }
    Ok(())
}

/// Compare the bytes on disk with the declared total.
///
/// An unknown or zero total cannot be verified and is accepted as-is.
pub fn check_length(actual: u64, declared: Option<u64>) -> Result<()> {
    match declared {
        Some(expected) if expected > 0 && expected != actual => {
            Err(Error::LengthMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Magic bytes expected at the start of a structured archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSignature {
    magic: Vec<u8>,
    min_len: u64,
}

impl ArchiveSignature {
    /// ZIP local file header, shared by APK and JAR packages.
    pub const ZIP_MAGIC: &'static [u8] = &[0x50, 0x4B, 0x03, 0x04];

    /// Create a signature from its magic bytes and a minimum plausible size.
    pub fn new(magic: impl Into<Vec<u8>>, min_len: u64) -> Self {
        Self {
            magic: magic.into(),
            min_len,
        }
    }

    /// Signature of a ZIP-based package of at least 100 bytes.
    pub fn zip() -> Self {
        Self::new(Self::ZIP_MAGIC, 100)
    }

    pub fn magic(&self) -> &[u8] {
        &self.magic
    }

    pub fn min_len(&self) -> u64 {
        self.min_len
    }

    /// Returns `true` when `path` starts with the magic bytes and is large enough.
    pub async fn matches(&self, path: &Path) -> Result<bool> {
        let len = fs::metadata(path).await?.len();
        if len < self.min_len || len < self.magic.len() as u64 {
            return Ok(false);
        }
        let mut file = fs::File::open(path).await?;
        let mut header = vec![0u8; self.magic.len()];
        file.read_exact(&mut header).await?;
        Ok(header == self.magic)
    }

    /// Check `path` and delete it if it does not carry the signature.
    pub async fn verify_or_discard(&self, path: &Path) -> Result<()> {
        let valid = match self.matches(path).await {
            Ok(valid) => valid,
            Err(Error::IOError { source }) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::MissingArtifact(path.to_path_buf()));
            }
            Err(_) => false,
        };
        if valid {
            return Ok(());
        }

        warn!("Signature check failed for {:?}, deleting it", path);
        if let Err(e) = fs::remove_file(path).await {
            warn!("Unable to delete corrupt artifact {:?}: {}", path, e);
        }
        Err(Error::CorruptArtifact(path.to_path_buf()))
    }
}
