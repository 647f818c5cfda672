// attrfind/src/commands/compile.rs
//
// USE CASE: Persist a rule set's finding rule as a binary blob.

use anyhow::Context;
use std::path::Path;

use attrfind_core::application::save_rule_blob;
use attrfind_core::infrastructure::config::load_rule_set;
use attrfind_core::ports::RuleServices;

pub fn execute(rules: &Path, output: &Path) -> anyhow::Result<()> {
    let config = load_rule_set(rules)
        .with_context(|| format!("Failed to load rule set {}", rules.display()))?;

    let rule = config.finder.build(&RuleServices::default())?;
    let bytes = save_rule_blob(output, rule.as_ref())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "📦 {} '{}' -> {} ({} bytes)",
        rule.component_name(),
        config.name,
        output.display(),
        bytes
    );
    Ok(())
}
