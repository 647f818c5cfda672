// attrfind-core/src/ports/resource.rs

// What the rules need from the outside world to read pattern files and word lists,
// without knowing whether they come from a local disk or an embedded store.

use crate::error::FinderError;
use std::path::Path;
use std::time::SystemTime;

pub trait ResourceLoader: Send + Sync {
    /// Last modification time, `None` when the store does not track it.
    /// A missing resource is an error.
    fn fetch_modified(&self, path: &Path) -> Result<Option<SystemTime>, FinderError>;

    fn read_to_string(&self, path: &Path) -> Result<String, FinderError>;
}
