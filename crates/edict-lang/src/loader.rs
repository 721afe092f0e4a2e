//! Source loading for `import(...)`

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Where program sources come from
pub trait SourceLoader: Send + Sync {
    /// Read the source text at `path`
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the source does not exist or cannot be read.
    fn load(&self, path: &Path) -> io::Result<String>;

    /// Canonical identity of `path`, used to detect import cycles
    fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// Loads sources from the file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl SourceLoader for FileSystemLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Serves sources from memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, builder style
    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    /// Add or replace a source
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.sources.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no source registered for {}", path.display()),
            )
        })
    }
}

/// Resolve an import target against the file that imports it
pub fn resolve_import(origin: Option<&Path>, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match origin.and_then(Path::parent) {
        Some(directory) => directory.join(target),
        None => target.to_path_buf(),
    }
}
