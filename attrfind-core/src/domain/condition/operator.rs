// attrfind-core/src/domain/condition/operator.rs

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

// The discriminants are the int32 codes written into persisted blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalOp {
    #[default]
    Eq = 0,
    Neq = 1,
    Lt = 2,
    Gt = 3,
    Leq = 4,
    Geq = 5,
}

impl ConditionalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Lt => "lt",
            Self::Gt => "gt",
            Self::Leq => "leq",
            Self::Geq => "geq",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Leq => "<=",
            Self::Geq => ">=",
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Decodes a persisted operator code. Any unknown code is a logic error,
    /// never silently mapped to a default operator.
    pub fn from_raw(raw: i32) -> Result<Self, DomainError> {
        match raw {
            0 => Ok(Self::Eq),
            1 => Ok(Self::Neq),
            2 => Ok(Self::Lt),
            3 => Ok(Self::Gt),
            4 => Ok(Self::Leq),
            5 => Ok(Self::Geq),
            other => Err(DomainError::LogicError(format!(
                "Unknown conditional operator code: {}",
                other
            ))),
        }
    }

    /// Compares the measured value against the target.
    pub fn evaluate(self, measured: i32, target: i32) -> bool {
        match self {
            Self::Eq => measured == target,
            Self::Neq => measured != target,
            Self::Lt => measured < target,
            Self::Gt => measured > target,
            Self::Leq => measured <= target,
            Self::Geq => measured >= target,
        }
    }
}

/// Evaluates a comparison given by its raw operator code.
pub fn evaluate_raw(raw_op: i32, measured: i32, target: i32) -> Result<bool, DomainError> {
    Ok(ConditionalOp::from_raw(raw_op)?.evaluate(measured, target))
}

impl fmt::Display for ConditionalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for ConditionalOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eq" | "=" | "==" => Ok(Self::Eq),
            "neq" | "!=" | "<>" => Ok(Self::Neq),
            "lt" | "<" => Ok(Self::Lt),
            "gt" | ">" => Ok(Self::Gt),
            "leq" | "<=" => Ok(Self::Leq),
            "geq" | ">=" => Ok(Self::Geq),
            _ => Err(format!("Unknown conditional operator: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_relational_table() {
        assert!(ConditionalOp::Eq.evaluate(5, 5));
        assert!(!ConditionalOp::Lt.evaluate(5, 5));
        assert!(ConditionalOp::Geq.evaluate(6, 5));
        assert!(ConditionalOp::Neq.evaluate(4, 5));
        assert!(ConditionalOp::Gt.evaluate(6, 5));
        assert!(!ConditionalOp::Gt.evaluate(5, 5));
        assert!(ConditionalOp::Leq.evaluate(5, 5));
        assert!(!ConditionalOp::Leq.evaluate(6, 5));
    }

    #[test]
    fn test_unknown_raw_operator_is_logic_error() {
        let res = evaluate_raw(17, 5, 5);
        assert!(matches!(res, Err(DomainError::LogicError(_))));
    }

    #[test]
    fn test_raw_codes_are_stable() -> anyhow::Result<()> {
        for op in [
            ConditionalOp::Eq,
            ConditionalOp::Neq,
            ConditionalOp::Lt,
            ConditionalOp::Gt,
            ConditionalOp::Leq,
            ConditionalOp::Geq,
        ] {
            assert_eq!(ConditionalOp::from_raw(op.as_raw())?, op);
        }
        assert_eq!(ConditionalOp::Geq.as_raw(), 5);
        assert!(evaluate_raw(0, 5, 5)?);
        Ok(())
    }

    #[test]
    fn test_parsing_symbols_and_names() {
        assert_eq!(ConditionalOp::from_str(">="), Ok(ConditionalOp::Geq));
        assert_eq!(ConditionalOp::from_str("NEQ"), Ok(ConditionalOp::Neq));
        assert!(ConditionalOp::from_str("~").is_err());
        assert_eq!(ConditionalOp::Leq.to_string(), "<=");
    }
}
