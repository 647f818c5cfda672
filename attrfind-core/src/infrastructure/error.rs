// attrfind-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(attrfind::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    #[error("Resource file not found: {0}")]
    #[diagnostic(
        code(attrfind::infra::resource_missing),
        help("Pattern files and word lists must exist before a rule can run.")
    )]
    ResourceNotFound(String),

    // --- CONFIG / YAML / JSON ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(attrfind::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Parsing Error: {0}")]
    #[diagnostic(code(attrfind::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(attrfind::infra::config_missing))]
    ConfigNotFound(String),

    #[error("Invalid rule set definition: {0}")]
    #[diagnostic(code(attrfind::infra::validation))]
    Validation(#[from] validator::ValidationErrors),

    // --- TEMPLATING ---
    #[error("Tag Expansion Error: {0}")]
    #[diagnostic(
        code(attrfind::infra::template),
        help("Check the tag syntax ({{ source_doc_dir }}) inside the file name.")
    )]
    TemplateError(#[from] minijinja::Error),
}
