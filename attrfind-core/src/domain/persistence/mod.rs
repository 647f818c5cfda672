// attrfind-core/src/domain/persistence/mod.rs

pub mod registry;
pub mod stream;

pub use registry::{
    ComponentRegistry, ConditionLoader, FindingRuleLoader, LoadedComponent, MAX_NESTING_DEPTH,
    PreprocessorLoader,
};
pub use stream::{BlobReader, BlobWriter, ensure_supported};
