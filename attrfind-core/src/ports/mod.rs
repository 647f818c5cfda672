// attrfind-core/src/ports/mod.rs

pub mod resource;
pub mod tags;

pub use resource::ResourceLoader;
pub use tags::TagExpander;

use std::fmt;
use std::sync::Arc;

/// Outward services shared by the rules of one rule set.
/// The filesystem-backed default is wired in `application::services`.
#[derive(Clone)]
pub struct RuleServices {
    pub loader: Arc<dyn ResourceLoader>,
    pub tags: Arc<dyn TagExpander>,
}

impl RuleServices {
    pub fn new(loader: Arc<dyn ResourceLoader>, tags: Arc<dyn TagExpander>) -> Self {
        Self { loader, tags }
    }
}

impl fmt::Debug for RuleServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleServices").finish_non_exhaustive()
    }
}
