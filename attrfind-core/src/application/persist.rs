// attrfind-core/src/application/persist.rs

use std::fs;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::persistence::{BlobReader, ComponentRegistry};
use crate::domain::ports::FindingRule;
use crate::error::FinderError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

/// Serializes a finding rule (`[className][framed blob]`) and writes it atomically.
/// Returns the number of bytes written.
#[instrument(skip(rule), fields(component = rule.component_name()))]
pub fn save_rule_blob(path: &Path, rule: &dyn FindingRule) -> Result<usize, FinderError> {
    let bytes = ComponentRegistry::to_bytes(rule)?;
    atomic_write(path, &bytes)?;
    info!(bytes = bytes.len(), "Rule blob saved");
    Ok(bytes.len())
}

#[instrument(skip(registry))]
pub fn load_rule_blob(
    path: &Path,
    registry: &ComponentRegistry,
) -> Result<Box<dyn FindingRule>, FinderError> {
    let bytes = fs::read(path).map_err(InfrastructureError::Io)?;
    let mut reader = BlobReader::new(&bytes, "rule blob");
    let rule = registry.read_finding_rule(&mut reader)?;
    info!(component = rule.component_name(), "Rule blob loaded");
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::{CharacterConfidenceCondition, ConditionalOp};
    use crate::domain::document::{Document, SpatialString};
    use crate::domain::error::DomainError;
    use crate::domain::persistence::BlobWriter;
    use crate::domain::ports::Component;
    use crate::domain::rules::{LoopFinder, LoopType, NoOpPreprocessor, RegExprRule};
    use crate::ports::RuleServices;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_blob_file_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rule.bin");

        let mut inner = RegExprRule::new(r"[A-Z]\w+");
        inner.set_case_sensitive(true);
        let finder = LoopFinder::new(LoopType::DoLoop, 2)
            .with_finding_rule(Box::new(inner))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(Box::new(CharacterConfidenceCondition::new(ConditionalOp::Lt, 50)));

        let written = save_rule_blob(&path, &finder)?;
        assert_eq!(written as u64, fs::metadata(&path)?.len());

        let mut loaded = load_rule_blob(&path, &ComponentRegistry::with_builtins(RuleServices::default()))?;
        assert_eq!(loaded.describe(), finder.describe());

        let found = loaded.parse_text(&Document::new(SpatialString::text_only("John met Mary")))?;
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[test]
    fn test_newer_blob_is_rejected_with_both_versions() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("future.bin");

        let mut w = BlobWriter::new();
        w.write_string("RegExprRule")?;
        w.write_framed::<DomainError, _>(|w| {
            w.write_i32(RegExprRule::CURRENT_VERSION + 1);
            Ok(())
        })?;
        fs::write(&path, w.into_bytes())?;

        let err = load_rule_blob(&path, &ComponentRegistry::with_builtins(RuleServices::default()))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        insta::assert_snapshot!(err.to_string(), @"Unable to load newer RegExprRule: loader supports version 4, blob is version 5");
        Ok(())
    }
}
