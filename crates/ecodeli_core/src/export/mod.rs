//! Generated artifacts: semicolon CSV reports and recorded PDF layouts.
//!
//! # Responsibility
//! - Build export payloads fully in memory from already-mapped rows.
//! - Persist a finished payload with [`write_export`].
//!
//! # Invariants
//! - Builders are pure; only [`write_export`] touches the filesystem.
//! - An empty source list produces no artifact (`None`), never an empty file.

pub mod csv;
pub mod pdf;

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Failure while persisting an export.
#[derive(Debug)]
pub enum ExportError {
    /// Nothing to export.
    Empty,
    /// Target directory or file could not be written.
    Io { path: PathBuf, source: io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "nothing to export"),
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Writes `bytes` to `path`, creating missing parent directories.
///
/// Replaces any existing file at `path`.
///
/// # Errors
/// - [`ExportError::Empty`] when `bytes` is empty.
/// - [`ExportError::Io`] when the directory or the file cannot be written.
pub fn write_export(path: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let path = path.as_ref().to_path_buf();
    let started_at = Instant::now();
    if bytes.is_empty() {
        error!("event=export_write module=export status=error error_code=empty");
        return Err(ExportError::Empty);
    }

    let result = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&path, bytes));

    match result {
        Ok(()) => {
            info!(
                "event=export_write module=export status=ok bytes={} duration_ms={}",
                bytes.len(),
                started_at.elapsed().as_millis()
            );
            Ok(path)
        }
        Err(source) => {
            error!(
                "event=export_write module=export status=error duration_ms={} \
                 error_code=io error={}",
                started_at.elapsed().as_millis(),
                source
            );
            Err(ExportError::Io { path, source })
        }
    }
}
