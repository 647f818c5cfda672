// attrfind-core/src/domain/ports/component.rs

use crate::domain::document::{Attribute, Document};
use crate::domain::error::DomainError;
use crate::domain::persistence::BlobWriter;
use crate::error::FinderError;
use std::fmt;

/// Common surface of every pluggable rule object.
pub trait Component: fmt::Debug {
    /// Stable class name, also used as the type tag of nested blobs.
    fn component_name(&self) -> &'static str;

    /// Components without a configuration check are always considered configured.
    fn is_configured(&self) -> bool {
        true
    }

    /// Writes the component's framed blob (`[int32 length][version][fields...]`).
    fn save(&self, _writer: &mut BlobWriter) -> Result<(), FinderError> {
        Err(DomainError::NotPersistable(self.component_name()).into())
    }

    /// One-line human description of the configuration.
    fn describe(&self) -> String {
        self.component_name().to_string()
    }
}

/// Scans a document and emits zero or more attributes.
pub trait FindingRule: Component {
    fn parse_text(&mut self, document: &Document) -> Result<Vec<Attribute>, FinderError>;
}

/// Mutates a document in place without producing attributes.
pub trait Preprocessor: Component {
    fn process(&mut self, document: &mut Document) -> Result<(), FinderError>;
}

/// Boolean predicate over a document.
pub trait Condition: Component {
    fn process_condition(&mut self, document: &Document) -> Result<bool, FinderError>;
}
