// attrfind-core/src/infrastructure/fs.rs

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::error::FinderError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::ResourceLoader;

/// Writes `content` next to `path` in a temporary file, then renames it over `path`.
/// Readers see either the old file or the new one, never a partial blob.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent)?;
    // Same directory so the rename never crosses filesystems
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(content.as_ref())?;
    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    debug!(path = ?path, "File written atomically");
    Ok(())
}

fn not_found_as_resource(path: &Path, err: std::io::Error) -> InfrastructureError {
    if err.kind() == ErrorKind::NotFound {
        InfrastructureError::ResourceNotFound(path.display().to_string())
    } else {
        InfrastructureError::Io(err)
    }
}

/// Reads pattern files and word lists from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResourceLoader;

impl ResourceLoader for FsResourceLoader {
    fn fetch_modified(&self, path: &Path) -> Result<Option<SystemTime>, FinderError> {
        let metadata = fs::metadata(path).map_err(|e| not_found_as_resource(path, e))?;
        // Platforms without mtime fall back to "never changes".
        Ok(metadata.modified().ok())
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FinderError> {
        Ok(fs::read_to_string(path).map_err(|e| not_found_as_resource(path, e))?)
    }
}
