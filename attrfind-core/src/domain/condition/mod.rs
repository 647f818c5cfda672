// attrfind-core/src/domain/condition/mod.rs

pub mod aggregate;
pub mod character_confidence;
pub mod operator;

pub use aggregate::AggregateFunction;
pub use character_confidence::{CharacterConfidenceCondition, Combinator, ConditionSpec};
pub use operator::{ConditionalOp, evaluate_raw};
