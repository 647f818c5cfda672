// attrfind-core/src/domain/rules/mod.rs

pub mod loop_finder;
pub mod preprocessors;
pub mod regex_rule;

pub use loop_finder::{LoopExit, LoopFinder, LoopOutcome, LoopType, MaxIterationsDiagnostic};
pub use preprocessors::{NoOpPreprocessor, Replacement, ReplaceStringsPreprocessor};
pub use regex_rule::{RegExprRule, compile_pattern, find_matches};
