// attrfind-core/src/domain/cache.rs

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::FinderError;
use crate::ports::ResourceLoader;

#[derive(Debug)]
struct CachedFile<T> {
    path: PathBuf,
    modified: Option<SystemTime>,
    value: T,
}

/// A parsed file owned by one rule or scorer instance.
/// Reloaded when the path changes or, if requested, when the file timestamp moves.
#[derive(Debug)]
pub struct FileCache<T> {
    entry: Option<CachedFile<T>>,
    loads: usize,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self {
            entry: None,
            loads: 0,
        }
    }
}

impl<T> FileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the underlying file has been read.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn needs_reload(
        &self,
        loader: &dyn ResourceLoader,
        path: &Path,
        check_for_updates: bool,
    ) -> Result<bool, FinderError> {
        match &self.entry {
            Some(entry) if entry.path == path => {
                if !check_for_updates {
                    return Ok(false);
                }
                Ok(loader.fetch_modified(path)? != entry.modified)
            }
            _ => Ok(true),
        }
    }

    pub fn get_or_load<F>(
        &mut self,
        loader: &dyn ResourceLoader,
        path: &Path,
        check_for_updates: bool,
        parse: F,
    ) -> Result<&T, FinderError>
    where
        F: FnOnce(String) -> Result<T, FinderError>,
    {
        if self.needs_reload(loader, path, check_for_updates)? {
            let modified = loader.fetch_modified(path)?;
            let content = loader.read_to_string(path)?;
            let value = parse(content)?;
            debug!(path = ?path, "Resource file (re)loaded");
            self.entry = Some(CachedFile {
                path: path.to_path_buf(),
                modified,
                value,
            });
            self.loads += 1;
        }

        self.entry
            .as_ref()
            .map(|e| &e.value)
            .ok_or_else(|| FinderError::Internal("file cache is empty after load".into()))
    }
}
