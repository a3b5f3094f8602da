use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// OutputDir – export target, recreated empty on every run
// ---------------------------------------------------------------------------

/// A directory that existed empty when this value was created.
///
/// Construction is destructive: whatever was at the path is removed.
#[derive(Debug)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    /// Remove `path` recursively if present, then create it empty.
    pub fn reset(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_absent(&path)?;
        ensure_empty(&path)?;
        Ok(OutputDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `{dir}/{n}.png`
    pub fn clean_path(&self, n: usize) -> PathBuf {
        self.path.join(format!("{n}.png"))
    }

    /// `{dir}/{n}s.png`
    pub fn striped_path(&self, n: usize) -> PathBuf {
        self.path.join(format!("{n}s.png"))
    }

    pub fn is_empty(&self) -> Result<bool> {
        let mut entries = fs::read_dir(&self.path).map_err(|e| PipelineError::io(&self.path, e))?;
        Ok(entries.next().is_none())
    }
}

fn ensure_absent(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            log::debug!("Removed previous output directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

fn ensure_empty(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| PipelineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_removes_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out");
        fs::create_dir_all(target.join("nested")).unwrap();
        fs::write(target.join("stale.png"), b"old").unwrap();
        fs::write(target.join("nested/deep.txt"), b"old").unwrap();

        let out = OutputDir::reset(&target).unwrap();
        assert!(out.path().is_dir());
        assert!(out.is_empty().unwrap());
    }

    #[test]
    fn reset_creates_missing_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::reset(tmp.path().join("a/b/c")).unwrap();
        assert!(out.is_empty().unwrap());
    }

    #[test]
    fn pair_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let out = OutputDir::reset(tmp.path().join("out")).unwrap();
        assert_eq!(out.clean_path(1), out.path().join("1.png"));
        assert_eq!(out.striped_path(2), out.path().join("2s.png"));
    }

    #[test]
    fn file_in_the_way_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out");
        fs::write(&target, b"not a directory").unwrap();
        assert!(matches!(OutputDir::reset(&target), Err(PipelineError::Io { .. })));
    }
}
