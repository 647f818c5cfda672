// attrfind-core/src/application/services.rs

use std::sync::Arc;

use crate::infrastructure::fs::FsResourceLoader;
use crate::infrastructure::tags::JinjaTagExpander;
use crate::ports::RuleServices;

/// Filesystem resources with minijinja tag expansion.
impl Default for RuleServices {
    fn default() -> Self {
        Self::new(Arc::new(FsResourceLoader), Arc::new(JinjaTagExpander::new()))
    }
}
