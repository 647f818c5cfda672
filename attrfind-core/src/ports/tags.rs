// attrfind-core/src/ports/tags.rs

use crate::domain::document::TagContext;
use crate::error::FinderError;

/// Expands document tags (`{{ source_doc_dir }}`, ...) inside configured file names.
pub trait TagExpander: Send + Sync {
    fn expand(&self, template: &str, context: &TagContext) -> Result<String, FinderError>;
}
