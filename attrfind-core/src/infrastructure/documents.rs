// attrfind-core/src/infrastructure/documents.rs

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, instrument};

use crate::domain::document::{Attribute, Document, SpatialString};
use crate::error::FinderError;
use crate::infrastructure::error::InfrastructureError;

/// JSON document shape: `{ "text", "confidences"?, "source_doc_name"? }`.
#[derive(Debug, Deserialize)]
struct DocumentFile {
    text: String,
    #[serde(default)]
    confidences: Option<Vec<u8>>,
    #[serde(default)]
    source_doc_name: Option<String>,
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Loads a document from plain text (non-spatial) or JSON with per-character confidences.
/// The source document name defaults to the file path.
#[instrument]
pub fn load_document(path: &Path) -> Result<Document, FinderError> {
    let content = fs::read_to_string(path).map_err(InfrastructureError::Io)?;

    let (text, source) = if is_json(path) {
        let file: DocumentFile =
            serde_json::from_str(&content).map_err(InfrastructureError::JsonError)?;
        let text = match file.confidences {
            Some(confidences) => SpatialString::with_confidences(file.text, confidences)?,
            None => SpatialString::text_only(file.text),
        };
        (text, file.source_doc_name)
    } else {
        (SpatialString::text_only(content), None)
    };

    debug!(chars = text.as_str().chars().count(), spatial = text.is_spatial(), "Document loaded");
    Ok(Document::new(text).with_source(source.unwrap_or_else(|| path.display().to_string())))
}

/// Reads a JSON array of attributes (e.g. the output of `attrfind run --format json`).
#[instrument]
pub fn load_attributes(path: &Path) -> Result<Vec<Attribute>, FinderError> {
    let content = fs::read_to_string(path).map_err(InfrastructureError::Io)?;
    let attributes: Vec<Attribute> =
        serde_json::from_str(&content).map_err(InfrastructureError::JsonError)?;
    Ok(attributes)
}
