use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0:?} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("cannot create {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("cannot write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Directory that receives exports and the selection file. Files are
/// replaced whole: readers see either the previous content or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens `dir`, creating it and its parents when missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(PersistError::NotADirectory(dir)),
            Err(_) => fs::create_dir_all(&dir).map_err(|source| PersistError::CreateDir {
                path: dir.clone(),
                source,
            })?,
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` next to `{dir}/{filename}` without touching it yet.
    pub fn stage(&self, filename: &str, content: &[u8]) -> Result<StagedFile, PersistError> {
        let target = self.dir.join(filename);
        let fail = |source| PersistError::Write {
            path: target.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(fail)?;
        tmp.write_all(content).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;
        Ok(StagedFile { tmp, target })
    }

    pub fn replace(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        self.stage(filename, content)?.commit()
    }
}

/// Fully written content waiting to take over its target. Dropping it
/// discards the content and leaves the target alone.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Renames over the target in one step.
    pub fn commit(self) -> Result<PathBuf, PersistError> {
        let target = self.target;
        match self.tmp.persist(&target) {
            Ok(_) => Ok(target),
            Err(err) => Err(PersistError::Write {
                path: target,
                source: err.error,
            }),
        }
    }
}
