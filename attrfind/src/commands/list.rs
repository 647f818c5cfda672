// attrfind/src/commands/list.rs
//
// USE CASE: Show which rule sets a project defines.

use anyhow::Context;
use comfy_table::Table;
use std::path::Path;

use attrfind_core::infrastructure::config::{
    discover_rule_sets, load_project_settings_or_default, load_rule_set,
};
use attrfind_core::ports::RuleServices;

pub fn execute(project_dir: &Path) -> anyhow::Result<()> {
    let settings = load_project_settings_or_default(project_dir)?;
    let rule_set_dir = settings.rule_set_path(project_dir);
    let paths = discover_rule_sets(&rule_set_dir)
        .with_context(|| format!("No rule-set directory at {}", rule_set_dir.display()))?;

    println!("📚 Project: {} ({} rule sets)", settings.name, paths.len());

    let services = RuleServices::default();
    let mut table = Table::new();
    table.set_header(vec!["Rule set", "Finder", "File"]);
    for path in &paths {
        let config = load_rule_set(path)
            .with_context(|| format!("Invalid rule set {}", path.display()))?;
        let finder = config.finder.build(&services)?;
        let file = path.strip_prefix(&rule_set_dir).unwrap_or(path);
        table.add_row(vec![
            config.name.clone(),
            finder.describe(),
            file.display().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
