// attrfind-core/src/lib.rs

// 1. Documentation
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports: what the rules need from the outside world (resources, tag expansion)
pub mod ports;

// 2. Domain: documents, conditions, rules, scoring, blob codec.
// Depends on ports only.
pub mod domain;

// 3. Infrastructure (Adapters): filesystem, minijinja, YAML config, document files
pub mod infrastructure;

// 4. Application (Use Cases): run a rule set, save/load blobs, score attributes
pub mod application;

// --- ERRORS ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::FinderError;
