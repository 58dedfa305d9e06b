use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mirror_logging::mirror_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{sanitize_filename, Artifact};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Output directory for fetched artifacts.
///
/// Each save goes to a temp file in the same directory and is renamed into
/// place, so a half-written archive never shows up under its final name.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Uses `dir`, creating it (and its parents) if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        if dir.exists() && !dir.is_dir() {
            return Err(PersistError::NotADirectory(dir));
        }
        fs::create_dir_all(&dir).map_err(|source| PersistError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `artifact` under its (re-sanitized) file name and returns the
    /// final path. An existing file of the same name is replaced.
    pub fn save(&self, artifact: &Artifact) -> Result<PathBuf, PersistError> {
        let name = sanitize_filename(&artifact.filename);
        let name = if name.is_empty() { "download".to_string() } else { name };
        let target = self.dir.join(name);

        let write_err = |source: io::Error| PersistError::Write {
            path: target.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(&artifact.bytes).map_err(write_err)?;
        tmp.as_file_mut().sync_all().map_err(write_err)?;
        tmp.persist(&target).map_err(|err| write_err(err.error))?;

        mirror_debug!("Wrote {} ({} bytes)", target.display(), artifact.bytes.len());
        Ok(target)
    }
}
