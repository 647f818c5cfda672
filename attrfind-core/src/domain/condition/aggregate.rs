// attrfind-core/src/domain/condition/aggregate.rs

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which statistic of the per-character OCR confidence feeds a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    #[default]
    Average = 0,
    Minimum = 1,
    Maximum = 2,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Result<Self, DomainError> {
        match raw {
            0 => Ok(Self::Average),
            1 => Ok(Self::Minimum),
            2 => Ok(Self::Maximum),
            other => Err(DomainError::LogicError(format!(
                "Unknown aggregate function code: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AggregateFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" | "avg" => Ok(Self::Average),
            "minimum" | "min" => Ok(Self::Minimum),
            "maximum" | "max" => Ok(Self::Maximum),
            _ => Err(format!("Unknown aggregate function: {}", s)),
        }
    }
}
