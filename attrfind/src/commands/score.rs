// attrfind/src/commands/score.rs
//
// USE CASE: Score Person/Company attributes against the project's word lists.

use anyhow::Context;
use comfy_table::Table;
use std::path::Path;
use std::sync::Arc;

use attrfind_core::application::score_attribute_file;
use attrfind_core::domain::scoring::EntityScorer;
use attrfind_core::infrastructure::config::load_project_settings_or_default;
use attrfind_core::infrastructure::fs::FsResourceLoader;

use crate::cli::OutputFormat;

pub fn execute(input: &Path, project_dir: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let settings = load_project_settings_or_default(project_dir)
        .with_context(|| format!("Failed to load project settings from {}", project_dir.display()))?;

    let mut scorer = EntityScorer::new(
        settings.scorer_settings(project_dir),
        Arc::new(FsResourceLoader),
    );
    let report = score_attribute_file(input, &mut scorer)
        .with_context(|| format!("Failed to score {}", input.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Name", "Value", "Kind", "Score"]);
            for s in &report.scores {
                table.add_row(vec![
                    s.name.clone(),
                    s.value.clone(),
                    format!("{:?}", s.kind),
                    s.score.to_string(),
                ]);
            }
            println!("{table}");
            println!("📊 Total: {}/100", report.total);
        }
    }
    Ok(())
}
