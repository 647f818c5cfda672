// attrfind-core/src/infrastructure/mod.rs

pub mod config;
pub mod documents;
pub mod error;
pub mod fs;
pub mod tags;
