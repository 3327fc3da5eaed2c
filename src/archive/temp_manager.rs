use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Intermediate files produced while processing one remote file.
///
/// Every tracked path is deleted when the guard drops, whether processing
/// finished or bailed out half way, unless `keep` was called.
#[derive(Debug, Default)]
pub struct IntermediateFiles {
    tracked: Vec<PathBuf>,
    keep: bool,
}

impl IntermediateFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path before anything is written to it
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        self.tracked.push(path.clone());
        path
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Leave tracked files on disk after drop
    pub fn keep(&mut self) {
        self.keep = true;
    }

    pub fn cleanup(&mut self) {
        for path in self.tracked.drain(..) {
            remove_if_exists(&path);
        }
    }
}

impl Drop for IntermediateFiles {
    fn drop(&mut self) {
        if self.keep {
            debug!("keeping {} intermediate file(s)", self.tracked.len());
            return;
        }
        self.cleanup();
    }
}

fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tracked_files_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.tif.gz");
        let b = dir.path().join("a.tif");
        {
            let mut files = IntermediateFiles::new();
            std::fs::write(files.track(&a), b"gz").unwrap();
            std::fs::write(files.track(&b), b"tif").unwrap();
            assert_eq!(files.tracked().len(), 2);
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn test_missing_tracked_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut files = IntermediateFiles::new();
        files.track(dir.path().join("never-written.tif"));
        drop(files);
    }

    #[test]
    fn test_keep_leaves_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.tif.gz");
        {
            let mut files = IntermediateFiles::new();
            std::fs::write(files.track(&a), b"gz").unwrap();
            files.keep();
        }
        assert!(a.exists());
    }

    #[test]
    fn test_files_removed_on_early_return() {
        fn failing_stage(dir: &Path) -> Result<(), String> {
            let mut files = IntermediateFiles::new();
            std::fs::write(files.track(dir.join("partial.tif.gz")), b"half").unwrap();
            Err("download interrupted".to_string())
        }

        let dir = TempDir::new().unwrap();
        assert!(failing_stage(dir.path()).is_err());
        assert!(!dir.path().join("partial.tif.gz").exists());
    }
}
