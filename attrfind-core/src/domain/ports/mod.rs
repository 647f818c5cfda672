// attrfind-core/src/domain/ports/mod.rs

pub mod component;

pub use component::{Component, Condition, FindingRule, Preprocessor};
