// attrfind-core/src/domain/document/mod.rs

pub mod attribute;
#[allow(clippy::module_inception)]
pub mod document;
pub mod spatial_string;

pub use attribute::Attribute;
pub use document::{Document, TagContext};
pub use spatial_string::SpatialString;
