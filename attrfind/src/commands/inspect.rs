// attrfind/src/commands/inspect.rs
//
// USE CASE: Inspect a persisted rule blob.

use anyhow::Context;
use std::path::Path;

use attrfind_core::application::load_rule_blob;
use attrfind_core::domain::persistence::ComponentRegistry;
use attrfind_core::ports::RuleServices;

pub fn execute(blob: &Path) -> anyhow::Result<()> {
    let registry = ComponentRegistry::with_builtins(RuleServices::default());
    let rule = load_rule_blob(blob, &registry)
        .with_context(|| format!("Failed to load rule blob {}", blob.display()))?;

    println!("\n🔍 Inspecting blob: {}", blob.display());
    println!("   Component:  {}", rule.component_name());
    println!("   Configured: {}", rule.is_configured());
    println!("   Rule:       {}", rule.describe());
    Ok(())
}
