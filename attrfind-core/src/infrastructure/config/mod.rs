pub mod project;
pub mod rule_set;

pub use project::{ProjectSettings, load_project_settings, load_project_settings_or_default};
pub use rule_set::{
    ConditionConfig, FinderConfig, LoopConfig, PreprocessorConfig, RuleSetConfig, discover_rule_sets,
    load_rule_set, parse_rule_set,
};
