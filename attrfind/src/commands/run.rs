// attrfind/src/commands/run.rs
//
// USE CASE: Run one rule set against one document.

use anyhow::Context;
use comfy_table::Table;
use std::path::Path;
use tracing::debug;

use attrfind_core::application::{RunReport, run_rule_set};
use attrfind_core::domain::document::Attribute;
use attrfind_core::infrastructure::config::load_rule_set;
use attrfind_core::infrastructure::documents::load_document;
use attrfind_core::ports::RuleServices;

use crate::cli::OutputFormat;

pub fn execute(rules: &Path, input: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_rule_set(rules)
        .with_context(|| format!("Failed to load rule set {}", rules.display()))?;
    let document = load_document(input)
        .with_context(|| format!("Failed to load document {}", input.display()))?;

    debug!(rule_set = %config.name, source = ?document.source_doc_name, "Running rule set");
    let report = run_rule_set(&config, &document, &RuleServices::default())?;

    match format {
        // A bare attribute array, so it can be fed straight into `attrfind score`.
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.attributes)?),
        OutputFormat::Table => print_table(&report),
    }

    if let Some(diagnostic) = &report.diagnostic {
        eprintln!(
            "⚠️  Loop reached max iterations ({}) in rule set '{}' for '{}'",
            diagnostic.max_iterations,
            diagnostic.rule_set.as_deref().unwrap_or("?"),
            diagnostic.source_document.as_deref().unwrap_or("?"),
        );
    }
    Ok(())
}

fn print_table(report: &RunReport) {
    if report.skipped {
        println!("⏭️  Rule set '{}' skipped: its condition was not met", report.rule_set);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Value", "Type", "Sub-attributes"]);
    for (i, attribute) in report.attributes.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            attribute.name.clone(),
            attribute.value.as_str().to_string(),
            attribute.attribute_type.clone(),
            render_children(attribute),
        ]);
    }
    println!("{table}");

    let mut summary = format!(
        "📊 {} attribute(s) from '{}' in {} ms",
        report.attributes.len(),
        report.rule_set,
        report.duration_ms
    );
    if let (Some(iterations), Some(exit)) = (report.iterations, report.exit) {
        summary.push_str(&format!(" ({} iteration(s), {:?})", iterations, exit));
    }
    println!("{summary}");
}

fn render_children(attribute: &Attribute) -> String {
    attribute
        .sub_attributes
        .iter()
        .map(|c| format!("{}={}", c.name, c.value.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}
