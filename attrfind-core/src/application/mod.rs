// attrfind-core/src/application/mod.rs

pub mod persist;
pub mod run;
pub mod score;
pub mod services;

// Lets the CLI do `use attrfind_core::application::{run_rule_set, save_rule_blob};`
pub use persist::{load_rule_blob, save_rule_blob};
pub use run::{RunReport, run_rule_set};
pub use score::{AttributeScore, ScoreReport, score_attribute_file};
