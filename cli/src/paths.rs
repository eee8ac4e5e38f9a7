//! Well-known locations under `~/.sentinel`.

use std::io;
use std::path::PathBuf;

/// Default base directory name.
pub const DEFAULT_BASE_DIR: &str = ".sentinel";

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default database filename.
pub const DEFAULT_STORE_FILE: &str = "sentinel.redb";

/// Provides access to the sentinel directory structure.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Paths rooted at `~/.sentinel`.
    pub fn new() -> io::Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not find home directory"))?;
        Ok(Self::with_base(home.join(DEFAULT_BASE_DIR)))
    }

    /// Paths rooted at an arbitrary directory.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(DEFAULT_CONFIG_FILE)
    }

    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(DEFAULT_STORE_FILE)
    }

    /// Creates the base directory if it doesn't exist.
    pub fn ensure_base_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_structure() {
        let paths = Paths::with_base("/tmp/sentinel-test");
        assert!(paths.config_file().ends_with("config.yaml"));
        assert!(paths.store_file().ends_with("sentinel.redb"));
        assert_eq!(paths.config_file().parent(), Some(paths.base_dir().as_path()));
    }

    #[test]
    fn test_default_base() {
        if let Ok(paths) = Paths::new() {
            assert!(paths.base_dir().ends_with(".sentinel"));
        }
    }

    #[test]
    fn test_ensure_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path().join("nested").join(".sentinel"));
        paths.ensure_base_dir().unwrap();
        assert!(paths.base_dir().is_dir());
    }
}
