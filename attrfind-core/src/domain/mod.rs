// attrfind-core/src/domain/mod.rs

pub mod cache;
pub mod condition;
pub mod document;
pub mod error;
pub mod persistence;
pub mod ports;
pub mod rules;
pub mod scoring;

pub use error::DomainError;
