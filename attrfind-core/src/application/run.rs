// attrfind-core/src/application/run.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::document::{Attribute, Document};
use crate::domain::rules::{LoopExit, MaxIterationsDiagnostic};
use crate::error::FinderError;
use crate::infrastructure::config::{FinderConfig, RuleSetConfig};
use crate::ports::RuleServices;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub rule_set: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,
    /// The rule set's own condition was not satisfied.
    pub skipped: bool,
    pub attributes: Vec<Attribute>,
    /// Set when the top-level finder is a loop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<LoopExit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<MaxIterationsDiagnostic>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Runs one rule set against a document.
/// The caller's document is never modified; preprocessing happens on a copy.
#[instrument(skip_all, fields(rule_set = %config.name))]
pub fn run_rule_set(
    config: &RuleSetConfig,
    document: &Document,
    services: &RuleServices,
) -> Result<RunReport, FinderError> {
    let started_at = Utc::now();
    let mut working = document.clone().with_rule_set(config.name.clone());

    let mut report = RunReport {
        rule_set: config.name.clone(),
        source_document: working.source_doc_name.clone(),
        skipped: false,
        attributes: Vec::new(),
        iterations: None,
        exit: None,
        diagnostic: None,
        started_at,
        duration_ms: 0,
    };

    if let Some(preprocessor) = &config.preprocessor {
        preprocessor.build().process(&mut working)?;
    }

    let satisfied = match &config.condition {
        Some(condition) => condition.build().process_condition(&working)?,
        None => true,
    };

    if satisfied {
        match &config.finder {
            FinderConfig::Loop(loop_config) => {
                let outcome = loop_config.build(services)?.run(&working)?;
                report.attributes = outcome.attributes;
                report.iterations = Some(outcome.iterations);
                report.exit = Some(outcome.exit);
                report.diagnostic = outcome.max_iterations_diagnostic;
            }
            finder => {
                report.attributes = finder.build(services)?.parse_text(&working)?;
            }
        }
    } else {
        report.skipped = true;
    }

    report.duration_ms = (Utc::now() - started_at).num_milliseconds();
    info!(
        attributes = report.attributes.len(),
        skipped = report.skipped,
        duration_ms = report.duration_ms,
        "Rule set finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::SpatialString;
    use crate::infrastructure::config::parse_rule_set;
    use anyhow::Result;

    fn doc(text: &str) -> Document {
        Document::new(SpatialString::text_only(text)).with_source("/in/doc.txt")
    }

    #[test]
    fn test_regex_rule_set() -> Result<()> {
        let config = parse_rule_set(
            r#"
name: Phones
finder:
  type: regex
  pattern: '(?<area>\d{3})-\d{4}'
  sub_attributes: true
"#,
        )?;
        let report = run_rule_set(&config, &doc("call 555-1234"), &RuleServices::default())?;
        assert_eq!(report.rule_set, "Phones");
        assert_eq!(report.attributes.len(), 1);
        assert_eq!(report.attributes[0].value.as_str(), "555-1234");
        assert!(report.attributes[0].has_sub_attribute("area"));
        assert!(report.iterations.is_none());
        Ok(())
    }

    #[test]
    fn test_loop_rule_set_reports_diagnostic() -> Result<()> {
        let config = parse_rule_set(
            r#"
name: Stuck
finder:
  type: loop
  loop_type: do
  max_iterations: 3
  log_on_max_iterations: true
  finder: { type: regex, pattern: 'x' }
  condition: { type: character_confidence, op: geq, value: 0 }
"#,
        )?;
        let report = run_rule_set(&config, &doc("x"), &RuleServices::default())?;
        assert_eq!(report.iterations, Some(3));
        assert_eq!(report.exit, Some(LoopExit::MaxIterationsReached));
        assert_eq!(report.attributes.len(), 3);
        let diagnostic = report.diagnostic.ok_or_else(|| anyhow::anyhow!("no diagnostic"))?;
        assert_eq!(diagnostic.rule_set.as_deref(), Some("Stuck"));
        assert_eq!(diagnostic.source_document.as_deref(), Some("/in/doc.txt"));
        Ok(())
    }

    #[test]
    fn test_rule_set_preprocessor_and_condition() -> Result<()> {
        let config = parse_rule_set(
            r#"
name: Gated
preprocessor:
  type: replace
  replacements: [{ pattern: 'O', replacement: '0' }]
condition: { type: character_confidence, op: geq, value: 50 }
finder: { type: regex, pattern: '\d+' }
"#,
        )?;
        let input = doc("1O1");
        let report = run_rule_set(&config, &input, &RuleServices::default())?;
        assert_eq!(report.attributes[0].value.as_str(), "101");
        assert_eq!(input.text().as_str(), "1O1");

        let low = Document::new(SpatialString::with_confidences("12", vec![10, 10])?);
        let report = run_rule_set(&config, &low, &RuleServices::default())?;
        assert!(report.skipped);
        assert!(report.attributes.is_empty());
        Ok(())
    }
}
