// attrfind-core/src/infrastructure/config/project.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::scoring::ScorerSettings;
use crate::infrastructure::error::InfrastructureError;

pub const ENV_DATA_DIR: &str = "ATTRFIND_DATA_DIR";
pub const ENV_CHECK_FOR_UPDATES: &str = "ATTRFIND_CHECK_FOR_UPDATES";

/// Project-level settings read from `attrfind.yaml`.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectSettings {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    /// Holds `common_words.txt` and `invalid_person_words.txt`.
    #[serde(rename = "data-dir", alias = "data_dir", default = "default_data_dir")]
    pub data_dir: String,

    /// Re-check word-list timestamps on every scoring session.
    #[serde(
        rename = "check-for-updates",
        alias = "check_for_updates",
        default = "default_true"
    )]
    pub check_for_updates: bool,

    #[serde(
        rename = "rule-set-dir",
        alias = "rule_set_dir",
        default = "default_rule_set_dir"
    )]
    pub rule_set_dir: String,
}

fn default_data_dir() -> String {
    "data".to_string()
}
fn default_rule_set_dir() -> String {
    "rules".to_string()
}
fn default_true() -> bool {
    true
}

impl ProjectSettings {
    /// Settings used when a directory has no `attrfind.yaml`.
    pub fn standalone(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_dir: default_data_dir(),
            check_for_updates: true,
            rule_set_dir: default_rule_set_dir(),
        }
    }

    /// Relative directories are resolved against the project directory.
    pub fn scorer_settings(&self, project_dir: &Path) -> ScorerSettings {
        ScorerSettings {
            data_dir: resolve(project_dir, &self.data_dir),
            check_for_updates: self.check_for_updates,
        }
    }

    pub fn rule_set_path(&self, project_dir: &Path) -> PathBuf {
        resolve(project_dir, &self.rule_set_dir)
    }
}

fn resolve(project_dir: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_project_settings(project_dir: &Path) -> Result<ProjectSettings, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project settings");

    let content = fs::read_to_string(&config_path)?;
    let mut settings: ProjectSettings = serde_yaml::from_str(&content)?;
    settings.validate()?;

    // Layering: ATTRFIND_DATA_DIR=/srv/words attrfind score ...
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

/// Like [`load_project_settings`], but a directory without a settings file
/// yields defaults (env overrides still apply).
pub fn load_project_settings_or_default(
    project_dir: &Path,
) -> Result<ProjectSettings, InfrastructureError> {
    match load_project_settings(project_dir) {
        Err(InfrastructureError::ConfigNotFound(_)) => {
            let name = project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attrfind".to_string());
            let mut settings = ProjectSettings::standalone(name);
            apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
            Ok(settings)
        }
        other => other,
    }
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["attrfind.yaml", "attrfind_project.yaml"];
    for filename in candidates {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, candidates
    )))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, InfrastructureError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(InfrastructureError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

pub fn apply_env_overrides<F>(
    settings: &mut ProjectSettings,
    lookup: F,
) -> Result<(), InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_DATA_DIR) {
        info!(old = ?settings.data_dir, new = ?val, "Overriding data dir via ENV");
        settings.data_dir = val;
    }
    if let Some(val) = lookup(ENV_CHECK_FOR_UPDATES) {
        let flag = parse_flag(ENV_CHECK_FOR_UPDATES, &val)?;
        info!(old = settings.check_for_updates, new = flag, "Overriding update checks via ENV");
        settings.check_for_updates = flag;
    }
    Ok(())
}
