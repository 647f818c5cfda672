// attrfind-core/src/infrastructure/config/rule_set.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use validator::{Validate, ValidationError, ValidationErrors};
use walkdir::WalkDir;

use crate::domain::condition::{
    AggregateFunction, CharacterConfidenceCondition, Combinator, ConditionSpec, ConditionalOp,
};
use crate::domain::ports::{Condition, FindingRule, Preprocessor};
use crate::domain::rules::{
    LoopFinder, LoopType, NoOpPreprocessor, RegExprRule, Replacement, ReplaceStringsPreprocessor,
};
use crate::error::FinderError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::RuleServices;

const RULE_SET_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

// --- DEFINITIONS ---

/// A named rule set as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RuleSetConfig {
    #[validate(length(min = 1, message = "Rule set name cannot be empty"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Applied to the document copy before the finder runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<PreprocessorConfig>,

    /// When present and not satisfied, the rule set is skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionConfig>,

    pub finder: FinderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinderConfig {
    Regex(RegexRuleConfig),
    Loop(Box<LoopConfig>),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_pattern_source"))]
pub struct RegexRuleConfig {
    #[serde(default)]
    pub pattern: String,
    /// Pattern file name; may contain document tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub sub_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoopConfig {
    #[serde(default)]
    pub loop_type: LoopType,
    #[validate(range(min = 1, message = "max_iterations must be at least 1"))]
    pub max_iterations: i32,
    #[serde(default)]
    pub log_on_max_iterations: bool,
    /// Value the condition must produce for the loop to keep going.
    #[serde(default = "default_true")]
    pub continue_while: bool,
    pub finder: FinderConfig,
    #[serde(default = "default_preprocessor")]
    pub preprocessor: PreprocessorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PreprocessorConfig {
    Replace(ReplaceConfig),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplaceConfig {
    #[serde(default)]
    pub case_sensitive: bool,
    #[validate(length(min = 1, message = "At least one replacement is required"))]
    #[validate(custom(function = "validate_replacements"))]
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionConfig {
    CharacterConfidence(CharacterConfidenceConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CharacterConfidenceConfig {
    #[serde(default)]
    pub aggregate: AggregateFunction,
    pub op: ConditionalOp,
    #[validate(range(min = 0, max = 100))]
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<ConditionSpec>,
    #[serde(default)]
    pub combinator: Combinator,
    #[serde(default = "default_true")]
    pub is_met: bool,
}

fn default_true() -> bool {
    true
}

fn default_preprocessor() -> PreprocessorConfig {
    PreprocessorConfig::None
}

fn validate_pattern_source(config: &RegexRuleConfig) -> Result<(), ValidationError> {
    let has_file = config.file.as_deref().is_some_and(|f| !f.trim().is_empty());
    if config.pattern.is_empty() && !has_file {
        let mut err = ValidationError::new("pattern_source");
        err.message = Some("A regex finder needs either `pattern` or `file`".into());
        return Err(err);
    }
    Ok(())
}

fn validate_replacements(replacements: &[Replacement]) -> Result<(), ValidationError> {
    if replacements.iter().any(|r| r.pattern.is_empty()) {
        let mut err = ValidationError::new("empty_pattern");
        err.message = Some("Replacement patterns cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

// --- VALIDATION (recursive) ---

impl Validate for FinderConfig {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Regex(config) => config.validate(),
            Self::Loop(config) => {
                config.validate()?;
                config.finder.validate()?;
                config.preprocessor.validate()?;
                if let Some(condition) = &config.condition {
                    condition.validate()?;
                }
                if config.loop_type != LoopType::ForLoop && config.condition.is_none() {
                    let mut errors = ValidationErrors::new();
                    let mut err = ValidationError::new("missing_condition");
                    err.message = Some(
                        format!("A {} loop needs a condition", config.loop_type).into(),
                    );
                    errors.add("condition", err);
                    return Err(errors);
                }
                Ok(())
            }
        }
    }
}

impl Validate for PreprocessorConfig {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Replace(config) => config.validate(),
            Self::None => Ok(()),
        }
    }
}

impl Validate for ConditionConfig {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::CharacterConfidence(config) => config.validate(),
        }
    }
}

impl RuleSetConfig {
    /// Validates the rule set and every nested component definition.
    pub fn validate_tree(&self) -> Result<(), InfrastructureError> {
        self.validate()?;
        self.finder.validate()?;
        if let Some(pp) = &self.preprocessor {
            pp.validate()?;
        }
        if let Some(condition) = &self.condition {
            condition.validate()?;
        }
        Ok(())
    }
}

// --- BUILDERS ---

impl FinderConfig {
    pub fn build(&self, services: &RuleServices) -> Result<Box<dyn FindingRule>, FinderError> {
        match self {
            Self::Regex(config) => {
                let mut rule = match config.file.as_deref().filter(|f| !f.trim().is_empty()) {
                    Some(file) => RegExprRule::from_file(file),
                    None => RegExprRule::new(config.pattern.clone()),
                }
                .with_services(services.clone());
                rule.set_case_sensitive(config.case_sensitive);
                rule.set_create_sub_attributes(config.sub_attributes);
                Ok(Box::new(rule))
            }
            Self::Loop(config) => Ok(Box::new(config.build(services)?)),
        }
    }
}

impl LoopConfig {
    pub fn build(&self, services: &RuleServices) -> Result<LoopFinder, FinderError> {
        let mut finder = LoopFinder::new(self.loop_type, self.max_iterations)
            .with_finding_rule(self.finder.build(services)?)
            .with_preprocessor(self.preprocessor.build());
        if let Some(condition) = &self.condition {
            finder.set_condition(Some(condition.build()));
        }
        finder.set_condition_value(self.continue_while);
        finder.set_log_exception_on_max_iterations(self.log_on_max_iterations);
        Ok(finder)
    }
}

impl PreprocessorConfig {
    pub fn build(&self) -> Box<dyn Preprocessor> {
        match self {
            Self::Replace(config) => Box::new(ReplaceStringsPreprocessor::new(
                config.replacements.clone(),
                config.case_sensitive,
            )),
            Self::None => Box::new(NoOpPreprocessor),
        }
    }
}

impl ConditionConfig {
    pub fn build(&self) -> Box<dyn Condition> {
        match self {
            Self::CharacterConfidence(config) => {
                let mut condition = CharacterConfidenceCondition::new(config.op, config.value);
                condition.set_aggregate_function(config.aggregate);
                if let Some(second) = config.second {
                    condition = condition.with_second(second, config.combinator);
                }
                condition.set_is_met(config.is_met);
                Box::new(condition)
            }
        }
    }
}

// --- LOADERS ---

pub fn parse_rule_set(content: &str) -> Result<RuleSetConfig, InfrastructureError> {
    let config: RuleSetConfig = serde_yaml::from_str(content)?;
    config.validate_tree()?;
    Ok(config)
}

#[instrument]
pub fn load_rule_set(path: &Path) -> Result<RuleSetConfig, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    let config = parse_rule_set(&content).map_err(|e| match e {
        InfrastructureError::YamlError(err) => {
            InfrastructureError::ConfigError(format!("{}: {}", path.display(), err))
        }
        other => other,
    })?;
    info!(rule_set = %config.name, "Rule set loaded");
    Ok(config)
}

/// Every rule set definition under `dir`, sorted by path.
pub fn discover_rule_sets(dir: &Path) -> Result<Vec<PathBuf>, InfrastructureError> {
    if !dir.exists() {
        return Err(InfrastructureError::ConfigNotFound(dir.display().to_string()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
        let path = entry.path();
        let is_rule_set = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| RULE_SET_EXTENSIONS.contains(&ext));
        if entry.file_type().is_file() && is_rule_set {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    debug!(count = paths.len(), dir = ?dir, "Rule sets discovered");
    Ok(paths)
}
