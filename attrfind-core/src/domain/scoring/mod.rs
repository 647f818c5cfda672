// attrfind-core/src/domain/scoring/mod.rs

pub mod entity_scorer;
pub mod word_lists;

pub use entity_scorer::{EntityKind, EntityScorer, MAX_SCORE, ScorerSettings, aggregate_scores};
pub use word_lists::{CommonWords, InvalidPersonWords};
