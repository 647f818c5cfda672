// attrfind-core/src/domain/document/document.rs

use crate::domain::condition::AggregateFunction;
use crate::domain::document::{Attribute, SpatialString};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The unit a rule runs against. `Clone` is the deep copy a loop works on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: SpatialString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_doc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Document {
    pub fn new(text: SpatialString) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_doc_name: impl Into<String>) -> Self {
        self.source_doc_name = Some(source_doc_name.into());
        self
    }

    pub fn with_rule_set(mut self, rule_set_name: impl Into<String>) -> Self {
        self.rule_set_name = Some(rule_set_name.into());
        self
    }

    pub fn text(&self) -> &SpatialString {
        &self.text
    }

    pub fn set_text(&mut self, text: SpatialString) {
        self.text = text;
    }

    pub fn char_confidence(&self, function: AggregateFunction) -> i32 {
        self.text.char_confidence(function)
    }

    /// Values available to file-name tags (`{{ source_doc_dir }}` ...).
    pub fn tag_context(&self) -> TagContext {
        let source = self.source_doc_name.clone().unwrap_or_default();
        let path = Path::new(&source);
        TagContext {
            source_doc_dir: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_doc_stem: path
                .file_stem()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_doc_name: source,
            rule_set_name: self.rule_set_name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TagContext {
    pub source_doc_name: String,
    pub source_doc_dir: String,
    pub source_doc_stem: String,
    pub rule_set_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_independent() {
        let original = Document::new("abc".into());
        let mut copy = original.clone();
        copy.set_text("xyz".into());
        assert_eq!(original.text().as_str(), "abc");
        assert_eq!(copy.text().as_str(), "xyz");
    }

    #[test]
    fn test_tag_context_splits_source_path() {
        let doc = Document::new("".into())
            .with_source("/data/in/invoice_17.tif")
            .with_rule_set("Invoices");
        let ctx = doc.tag_context();
        assert_eq!(ctx.source_doc_dir, "/data/in");
        assert_eq!(ctx.source_doc_stem, "invoice_17");
        assert_eq!(ctx.rule_set_name, "Invoices");
    }
}
