// attrfind-core/src/domain/condition/character_confidence.rs

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::condition::{AggregateFunction, ConditionalOp};
use crate::domain::document::Document;
use crate::domain::persistence::{BlobReader, BlobWriter, ensure_supported};
use crate::domain::ports::{Component, Condition};
use crate::error::FinderError;

/// One relational test against the measured confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub op: ConditionalOp,
    pub value: i32,
}

impl ConditionSpec {
    pub fn new(op: ConditionalOp, value: i32) -> Self {
        Self { op, value }
    }

    pub fn evaluate(&self, measured: i32) -> bool {
        self.op.evaluate(measured, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn combine(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
        }
    }
}

/// Tests a document's aggregate OCR confidence against one or two conditions.
///
/// The final result is `combined == is_met`, so the same object can express
/// either "confidence is in range" or "confidence is out of range".
#[derive(Debug, Clone)]
pub struct CharacterConfidenceCondition {
    aggregate_function: AggregateFunction,
    first_condition: ConditionSpec,
    has_second_condition: bool,
    second_condition: ConditionSpec,
    combinator: Combinator,
    is_met: bool,
    dirty: bool,
}

impl Default for CharacterConfidenceCondition {
    fn default() -> Self {
        Self {
            aggregate_function: AggregateFunction::Average,
            first_condition: ConditionSpec::new(ConditionalOp::Geq, 70),
            has_second_condition: false,
            second_condition: ConditionSpec::new(ConditionalOp::Leq, 100),
            combinator: Combinator::And,
            is_met: true,
            dirty: false,
        }
    }
}

// The dirty flag is bookkeeping, not configuration.
impl PartialEq for CharacterConfidenceCondition {
    fn eq(&self, other: &Self) -> bool {
        self.aggregate_function == other.aggregate_function
            && self.first_condition == other.first_condition
            && self.has_second_condition == other.has_second_condition
            && self.second_condition == other.second_condition
            && self.combinator == other.combinator
            && self.is_met == other.is_met
    }
}

impl CharacterConfidenceCondition {
    pub const COMPONENT_NAME: &'static str = "CharacterConfidenceCondition";
    pub const CURRENT_VERSION: i32 = 1;

    pub fn new(op: ConditionalOp, value: i32) -> Self {
        Self {
            first_condition: ConditionSpec::new(op, value),
            ..Default::default()
        }
    }

    pub fn aggregate_function(&self) -> AggregateFunction {
        self.aggregate_function
    }

    pub fn first_condition(&self) -> ConditionSpec {
        self.first_condition
    }

    pub fn has_second_condition(&self) -> bool {
        self.has_second_condition
    }

    pub fn second_condition(&self) -> ConditionSpec {
        self.second_condition
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn is_met(&self) -> bool {
        self.is_met
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn update<T: PartialEq>(field: &mut T, value: T, dirty: &mut bool) {
        if *field != value {
            *field = value;
            *dirty = true;
        }
    }

    pub fn set_aggregate_function(&mut self, function: AggregateFunction) {
        Self::update(&mut self.aggregate_function, function, &mut self.dirty);
    }

    pub fn set_first_condition(&mut self, spec: ConditionSpec) {
        Self::update(&mut self.first_condition, spec, &mut self.dirty);
    }

    pub fn set_has_second_condition(&mut self, enabled: bool) {
        Self::update(&mut self.has_second_condition, enabled, &mut self.dirty);
    }

    pub fn set_second_condition(&mut self, spec: ConditionSpec) {
        Self::update(&mut self.second_condition, spec, &mut self.dirty);
    }

    /// Enables the second condition and sets how it combines with the first.
    pub fn with_second(mut self, spec: ConditionSpec, combinator: Combinator) -> Self {
        self.set_has_second_condition(true);
        self.set_second_condition(spec);
        self.set_combinator(combinator);
        self
    }

    pub fn set_combinator(&mut self, combinator: Combinator) {
        Self::update(&mut self.combinator, combinator, &mut self.dirty);
    }

    pub fn set_is_met(&mut self, is_met: bool) {
        Self::update(&mut self.is_met, is_met, &mut self.dirty);
    }

    /// Evaluates against an already measured confidence value.
    pub fn evaluate_measured(&self, measured: i32) -> bool {
        let mut result = self.first_condition.evaluate(measured);
        if self.has_second_condition {
            // Same measurement for both conditions, never re-queried.
            let second = self.second_condition.evaluate(measured);
            result = self.combinator.combine(result, second);
        }
        result == self.is_met
    }

    pub fn load(reader: &mut BlobReader<'_>) -> Result<Self, FinderError> {
        let mut r = reader.read_framed(Self::COMPONENT_NAME)?;
        let version = r.read_i32()?;
        ensure_supported(Self::COMPONENT_NAME, Self::CURRENT_VERSION, version)?;

        let first_op = ConditionalOp::from_raw(r.read_i32()?)?;
        let first_value = r.read_i32()?;
        let has_second_condition = r.read_bool()?;
        let second_op = ConditionalOp::from_raw(r.read_i32()?)?;
        let second_value = r.read_i32()?;
        let and_combine = r.read_bool()?;
        let aggregate_function = AggregateFunction::from_raw(r.read_i32()?)?;
        let is_met = r.read_bool()?;

        Ok(Self {
            aggregate_function,
            first_condition: ConditionSpec::new(first_op, first_value),
            has_second_condition,
            second_condition: ConditionSpec::new(second_op, second_value),
            combinator: if and_combine {
                Combinator::And
            } else {
                Combinator::Or
            },
            is_met,
            dirty: false,
        })
    }
}

impl Component for CharacterConfidenceCondition {
    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn save(&self, writer: &mut BlobWriter) -> Result<(), FinderError> {
        writer.write_framed(|w| {
            w.write_i32(Self::CURRENT_VERSION);
            w.write_i32(self.first_condition.op.as_raw());
            w.write_i32(self.first_condition.value);
            w.write_bool(self.has_second_condition);
            w.write_i32(self.second_condition.op.as_raw());
            w.write_i32(self.second_condition.value);
            w.write_bool(self.combinator == Combinator::And);
            w.write_i32(self.aggregate_function.as_raw());
            w.write_bool(self.is_met);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        let mut text = format!(
            "{} confidence {} {}",
            self.aggregate_function, self.first_condition.op, self.first_condition.value
        );
        if self.has_second_condition {
            let joiner = match self.combinator {
                Combinator::And => "and",
                Combinator::Or => "or",
            };
            text.push_str(&format!(
                " {} {} {}",
                joiner, self.second_condition.op, self.second_condition.value
            ));
        }
        if self.is_met {
            text.push_str(" is met");
        } else {
            text.push_str(" is not met");
        }
        text
    }
}

impl Condition for CharacterConfidenceCondition {
    fn process_condition(&mut self, document: &Document) -> Result<bool, FinderError> {
        let measured = document.char_confidence(self.aggregate_function);
        let result = self.evaluate_measured(measured);
        debug!(
            aggregate = %self.aggregate_function,
            measured,
            result,
            "Character confidence condition evaluated"
        );
        Ok(result)
    }
}
