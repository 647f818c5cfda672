// attrfind-core/src/domain/rules/preprocessors.rs

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::error::DomainError;
use crate::domain::persistence::{BlobReader, BlobWriter, ensure_supported};
use crate::domain::ports::{Component, Preprocessor};
use crate::domain::rules::regex_rule::compile_pattern;
use crate::error::FinderError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl Replacement {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Rewrites the document text in place, one regex replacement after another.
#[derive(Debug, Default)]
pub struct ReplaceStringsPreprocessor {
    replacements: Vec<Replacement>,
    case_sensitive: bool,
    compiled: Vec<Regex>,
}

impl ReplaceStringsPreprocessor {
    pub const COMPONENT_NAME: &'static str = "ReplaceStringsPreprocessor";
    pub const CURRENT_VERSION: i32 = 1;

    pub fn new(replacements: Vec<Replacement>, case_sensitive: bool) -> Self {
        Self {
            replacements,
            case_sensitive,
            compiled: Vec::new(),
        }
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn ensure_compiled(&mut self) -> Result<(), FinderError> {
        if self.compiled.len() == self.replacements.len() {
            return Ok(());
        }
        self.compiled = self
            .replacements
            .iter()
            .map(|r| compile_pattern(&r.pattern, self.case_sensitive))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }

    pub fn load(reader: &mut BlobReader<'_>) -> Result<Self, FinderError> {
        let mut r = reader.read_framed(Self::COMPONENT_NAME)?;
        let version = r.read_i32()?;
        ensure_supported(Self::COMPONENT_NAME, Self::CURRENT_VERSION, version)?;

        let case_sensitive = r.read_bool()?;
        let count = r.read_i32()?;
        if count < 0 {
            return Err(DomainError::corrupt(
                Self::COMPONENT_NAME,
                format!("negative replacement count {}", count),
            )
            .into());
        }
        // Each pair holds two length prefixes, so the frame bounds how many can follow.
        let mut replacements = Vec::with_capacity((count as usize).min(r.remaining() / 8));
        for _ in 0..count {
            let pattern = r.read_string()?;
            let replacement = r.read_string()?;
            replacements.push(Replacement {
                pattern,
                replacement,
            });
        }
        Ok(Self::new(replacements, case_sensitive))
    }
}

impl Component for ReplaceStringsPreprocessor {
    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn is_configured(&self) -> bool {
        !self.replacements.is_empty() && self.replacements.iter().all(|r| !r.pattern.is_empty())
    }

    fn save(&self, writer: &mut BlobWriter) -> Result<(), FinderError> {
        writer.write_framed(|w| {
            w.write_i32(Self::CURRENT_VERSION);
            w.write_bool(self.case_sensitive);
            let count = i32::try_from(self.replacements.len())
                .map_err(|_| FinderError::Internal("too many replacements".into()))?;
            w.write_i32(count);
            for r in &self.replacements {
                w.write_string(&r.pattern)?;
                w.write_string(&r.replacement)?;
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        format!("replace strings ({} rules)", self.replacements.len())
    }
}

impl Preprocessor for ReplaceStringsPreprocessor {
    fn process(&mut self, document: &mut Document) -> Result<(), FinderError> {
        self.ensure_compiled()?;
        let mut text = document.text().clone();
        for (regex, r) in self.compiled.iter().zip(&self.replacements) {
            text = text.replace_all(regex, &r.replacement);
        }
        document.set_text(text);
        Ok(())
    }
}

/// Leaves the document untouched; for loops that only re-run their rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPreprocessor;

impl NoOpPreprocessor {
    pub const COMPONENT_NAME: &'static str = "NoOpPreprocessor";
    pub const CURRENT_VERSION: i32 = 1;

    pub fn load(reader: &mut BlobReader<'_>) -> Result<Self, FinderError> {
        let mut r = reader.read_framed(Self::COMPONENT_NAME)?;
        let version = r.read_i32()?;
        ensure_supported(Self::COMPONENT_NAME, Self::CURRENT_VERSION, version)?;
        Ok(Self)
    }
}

impl Component for NoOpPreprocessor {
    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn save(&self, writer: &mut BlobWriter) -> Result<(), FinderError> {
        writer.write_framed(|w| {
            w.write_i32(Self::CURRENT_VERSION);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        "no-op".to_string()
    }
}

impl Preprocessor for NoOpPreprocessor {
    fn process(&mut self, _document: &mut Document) -> Result<(), FinderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::SpatialString;

    #[test]
    fn test_replacements_apply_in_order() -> anyhow::Result<()> {
        let mut pp = ReplaceStringsPreprocessor::new(
            vec![Replacement::new("cat", "dog"), Replacement::new("dog", "bird")],
            false,
        );
        let mut doc = Document::new(SpatialString::text_only("Cat and dog"));
        pp.process(&mut doc)?;
        assert_eq!(doc.text().as_str(), "bird and bird");
        Ok(())
    }

    #[test]
    fn test_capture_references_expand() -> anyhow::Result<()> {
        let mut pp = ReplaceStringsPreprocessor::new(
            vec![Replacement::new(r"(?<last>\w+), (?<first>\w+)", "$first $last")],
            true,
        );
        let mut doc = Document::new(SpatialString::text_only("Smith, John"));
        pp.process(&mut doc)?;
        assert_eq!(doc.text().as_str(), "John Smith");
        Ok(())
    }

    #[test]
    fn test_configuration_check() {
        assert!(!ReplaceStringsPreprocessor::default().is_configured());
        assert!(!ReplaceStringsPreprocessor::new(vec![Replacement::new("", "x")], false).is_configured());
        assert!(ReplaceStringsPreprocessor::new(vec![Replacement::new("a", "")], false).is_configured());
        // An empty pattern would match between every character.
        let mixed = vec![Replacement::new("a", "b"), Replacement::new("", "x")];
        assert!(!ReplaceStringsPreprocessor::new(mixed, false).is_configured());
    }

    fn blob_with_count(count: i32) -> Vec<u8> {
        let mut w = BlobWriter::new();
        w.write_framed::<DomainError, _>(|w| {
            w.write_i32(1);
            w.write_bool(false);
            w.write_i32(count);
            Ok(())
        })
        .ok();
        w.into_bytes()
    }

    #[test]
    fn test_oversized_count_is_corrupt() {
        let bytes = blob_with_count(i32::MAX);
        let res = ReplaceStringsPreprocessor::load(&mut BlobReader::new(&bytes, "test"));
        assert!(matches!(
            res,
            Err(FinderError::Domain(DomainError::CorruptBlob { .. }))
        ));
    }

    #[test]
    fn test_negative_count_is_corrupt() {
        let bytes = blob_with_count(-1);
        let res = ReplaceStringsPreprocessor::load(&mut BlobReader::new(&bytes, "test"));
        assert!(matches!(
            res,
            Err(FinderError::Domain(DomainError::CorruptBlob { .. }))
        ));
    }

    #[test]
    fn test_round_trip() -> anyhow::Result<()> {
        let pp = ReplaceStringsPreprocessor::new(vec![Replacement::new("a+", "b")], true);
        let mut w = BlobWriter::new();
        pp.save(&mut w)?;
        let bytes = w.into_bytes();
        let loaded = ReplaceStringsPreprocessor::load(&mut BlobReader::new(&bytes, "test"))?;
        assert_eq!(loaded.replacements(), pp.replacements());
        assert!(loaded.is_case_sensitive());
        Ok(())
    }
}
