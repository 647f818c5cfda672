// attrfind-core/src/infrastructure/tags.rs

// Expands document tags inside configured file names, e.g.
// "{{ source_doc_dir }}/patterns.dat.etf" -> "/scans/batch1/patterns.dat.etf".

use minijinja::{Environment, UndefinedBehavior};

use crate::domain::document::TagContext;
use crate::error::FinderError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::TagExpander;

pub struct JinjaTagExpander {
    env: Environment<'static>,
}

impl JinjaTagExpander {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // A misspelled tag must not silently become an empty path segment
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        env.add_filter("upper", |value: &str| Ok(value.to_uppercase()));
        env.add_filter("lower", |value: &str| Ok(value.to_lowercase()));

        Self { env }
    }
}

impl Default for JinjaTagExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JinjaTagExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTagExpander").finish_non_exhaustive()
    }
}

impl TagExpander for JinjaTagExpander {
    fn expand(&self, template: &str, context: &TagContext) -> Result<String, FinderError> {
        if !template.contains("{{") && !template.contains("{%") {
            return Ok(template.to_string());
        }
        self.env
            .render_str(template, context)
            .map_err(|e| InfrastructureError::TemplateError(e).into())
    }
}
