// attrfind-core/src/application/score.rs

use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::scoring::{EntityKind, EntityScorer, aggregate_scores};
use crate::error::FinderError;
use crate::infrastructure::documents::load_attributes;

#[derive(Debug, Clone, Serialize)]
pub struct AttributeScore {
    pub name: String,
    pub value: String,
    pub kind: EntityKind,
    pub score: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub scores: Vec<AttributeScore>,
    /// Sum of the individual scores, capped at 100.
    pub total: i32,
}

/// Scores every attribute of a JSON attribute file.
#[instrument(skip(scorer))]
pub fn score_attribute_file(
    path: &Path,
    scorer: &mut EntityScorer,
) -> Result<ScoreReport, FinderError> {
    let attributes = load_attributes(path)?;

    let mut scores = Vec::with_capacity(attributes.len());
    for attribute in &attributes {
        scores.push(AttributeScore {
            name: attribute.name.clone(),
            value: attribute.value.as_str().to_string(),
            kind: EntityKind::of(attribute),
            score: scorer.score_attribute(attribute)?,
        });
    }
    let total = aggregate_scores(&scores, |s| Ok(s.score))?;

    info!(attributes = scores.len(), total, "Attributes scored");
    Ok(ScoreReport { scores, total })
}
