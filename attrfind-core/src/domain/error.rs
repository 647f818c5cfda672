// attrfind-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("{component} is not configured: {reason}")]
    #[diagnostic(
        code(attrfind::domain::not_configured),
        help("Set the missing property on the rule and run it again.")
    )]
    NotConfigured {
        component: &'static str,
        reason: String,
    },

    // Programming defect (unreachable enum value). Never defaulted.
    #[error("Internal logic error: {0}")]
    #[diagnostic(code(attrfind::domain::logic))]
    LogicError(String),

    #[error(
        "Unable to load newer {component}: loader supports version {loader_version}, blob is version {blob_version}"
    )]
    #[diagnostic(
        code(attrfind::domain::version),
        help("The blob was written by a newer release. Upgrade attrfind to read it.")
    )]
    UnsupportedVersion {
        component: &'static str,
        loader_version: i32,
        blob_version: i32,
    },

    #[error("Corrupt {component} blob: {reason}")]
    #[diagnostic(code(attrfind::domain::corrupt_blob))]
    CorruptBlob {
        component: &'static str,
        reason: String,
    },

    #[error("{0} cannot be persisted")]
    #[diagnostic(code(attrfind::domain::not_persistable))]
    NotPersistable(&'static str),

    #[error("Invalid document: {0}")]
    #[diagnostic(code(attrfind::domain::document))]
    InvalidDocument(String),

    #[error("Invalid regular expression '{pattern}': {reason}")]
    #[diagnostic(
        code(attrfind::domain::pattern),
        help("Check the pattern syntax (named groups are written (?<Name>...)).")
    )]
    InvalidPattern { pattern: String, reason: String },
}

impl DomainError {
    pub fn not_configured(component: &'static str, reason: impl Into<String>) -> Self {
        Self::NotConfigured {
            component,
            reason: reason.into(),
        }
    }

    pub fn corrupt(component: &'static str, reason: impl Into<String>) -> Self {
        Self::CorruptBlob {
            component,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_error_mentions_both_versions() {
        let err = DomainError::UnsupportedVersion {
            component: "LoopFinder",
            loader_version: 1,
            blob_version: 3,
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"Unable to load newer LoopFinder: loader supports version 1, blob is version 3"
        );
    }
}
