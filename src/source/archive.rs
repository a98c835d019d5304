use crate::error::StreamError;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Upper bound on the buffer reserved from a member's declared size
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// The header size is only a hint; the buffer still grows past it if needed
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// Yields the raw bytes of a named member of a source archive
pub trait ArchiveExtractor {
    fn extract(&mut self, member: &str) -> Result<Vec<u8>, StreamError>;
}

/// Reads members from an MWX file, which is a plain zip archive.
///
/// The archive is reopened for every member so one unreadable payload does
/// not leave a half-read handle behind for the next.
pub struct ZipExtractor {
    path: PathBuf,
}

impl ZipExtractor {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, member: &str, reason: impl Into<String>) -> StreamError {
        StreamError::Extraction {
            archive: self.path.display().to_string(),
            member: member.to_string(),
            reason: reason.into(),
        }
    }

    fn open_archive(&self, member: &str) -> Result<ZipArchive<File>, StreamError> {
        let file = File::open(&self.path).map_err(|e| self.failure(member, e.to_string()))?;
        ZipArchive::new(file).map_err(|e| self.failure(member, e.to_string()))
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&mut self, member: &str) -> Result<Vec<u8>, StreamError> {
        let mut archive = self.open_archive(member)?;

        let mut entry = archive.by_name(member).map_err(|e| match e {
            ZipError::FileNotFound => self.failure(member, "member not found"),
            other => self.failure(member, other.to_string()),
        })?;

        let mut bytes = Vec::with_capacity(initial_capacity(entry.size()));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| self.failure(member, e.to_string()))?;

        if bytes.is_empty() {
            return Err(self.failure(member, "member is empty"));
        }

        debug!(target: "archive", "read {} bytes from {}", bytes.len(), member);
        Ok(bytes)
    }
}
