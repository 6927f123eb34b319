//! File mailbox adapter.
//!
//! Implements [`CommandSource`] over the plain-text file the game addon
//! writes its commands into. The addon may be mid-write or hold the file
//! open when we poll, so read failures are reported as transient
//! [`SourceError::Unavailable`] and the caller simply tries again.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::CommandSource;
use crate::error::SourceError;

pub struct FileMailbox {
    path: PathBuf,
}

impl FileMailbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for FileMailbox {
    fn prepare(&self) -> Result<(), SourceError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !dir.is_dir() {
            return Err(SourceError::MissingDirectory(dir.display().to_string()));
        }
        // A payload left over from an earlier run must not replay.
        if let Err(e) = fs::write(&self.path, "") {
            debug!("Mailbox: could not truncate {}: {}", self.path.display(), e);
        }
        info!("Mailbox: watching {}", self.path.display());
        Ok(())
    }

    fn poll(&self) -> Result<String, SourceError> {
        let bytes = fs::read(&self.path).map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn clear(&self) -> Result<(), SourceError> {
        fs::write(&self.path, "").map_err(|e| SourceError::Io(e.to_string()))
    }
}
