// attrfind-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    // --- ERREURS DU DOMAINE (configuration, logic, format) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, Parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS D'EXECUTION DE BOUCLE ---
    #[error("Loop iteration {iteration} failed: {source}")]
    Iteration {
        iteration: u32,
        #[source]
        source: Box<FinderError>,
    },

    #[error("Internal Error: {0}")]
    Internal(String),
}

impl FinderError {
    /// Programming defects: unknown enum values, impossible states.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Domain(DomainError::LogicError(_)) | Self::Internal(_) => true,
            Self::Iteration { source, .. } => source.is_fatal(),
            _ => false,
        }
    }

    /// User-correctable: the rule can be reconfigured and run again.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Domain(DomainError::NotConfigured { .. }) => true,
            Self::Iteration { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// Iteration number of the loop body that raised this error, if any.
    pub fn iteration(&self) -> Option<u32> {
        match self {
            Self::Iteration { iteration, .. } => Some(*iteration),
            _ => None,
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for FinderError {
    fn from(err: std::io::Error) -> Self {
        FinderError::Infrastructure(InfrastructureError::Io(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_wrapper_keeps_classification() {
        let inner = FinderError::Domain(DomainError::LogicError("bad op".into()));
        let err = FinderError::Iteration {
            iteration: 3,
            source: Box::new(inner),
        };
        assert!(err.is_fatal());
        assert!(!err.is_configuration());
        assert_eq!(err.iteration(), Some(3));
        assert!(err.to_string().contains("iteration 3"));
    }

    #[test]
    fn test_not_configured_is_not_fatal() {
        let err = FinderError::from(DomainError::not_configured("RegExprRule", "empty pattern"));
        assert!(err.is_configuration());
        assert!(!err.is_fatal());
    }
}
