// attrfind-core/src/domain/rules/loop_finder.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::domain::document::{Attribute, Document};
use crate::domain::error::DomainError;
use crate::domain::persistence::{BlobReader, BlobWriter, ComponentRegistry, ensure_supported};
use crate::domain::ports::{Component, Condition, FindingRule, Preprocessor};
use crate::error::FinderError;

// Discriminants are the persisted int32 codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoopType {
    /// Body first, condition checked after every iteration.
    #[default]
    #[serde(rename = "do")]
    DoLoop = 0,
    /// Condition checked before the first iteration and after every iteration.
    #[serde(rename = "while")]
    WhileLoop = 1,
    /// Fixed iteration count, no condition.
    #[serde(rename = "for")]
    ForLoop = 2,
}

impl LoopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoLoop => "do",
            Self::WhileLoop => "while",
            Self::ForLoop => "for",
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Result<Self, DomainError> {
        match raw {
            0 => Ok(Self::DoLoop),
            1 => Ok(Self::WhileLoop),
            2 => Ok(Self::ForLoop),
            other => Err(DomainError::LogicError(format!(
                "Unknown loop type code: {}",
                other
            ))),
        }
    }

    pub fn uses_condition(self) -> bool {
        self != Self::ForLoop
    }
}

impl fmt::Display for LoopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoopType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "do" | "do_loop" => Ok(Self::DoLoop),
            "while" | "while_loop" => Ok(Self::WhileLoop),
            "for" | "for_loop" => Ok(Self::ForLoop),
            _ => Err(format!("Unknown loop type: {}", s)),
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopExit {
    /// The continue-condition no longer matched the configured polarity.
    ConditionFailed,
    /// Max iterations reached while the continue-condition still held.
    MaxIterationsReached,
    /// A for loop ran its fixed count.
    Completed,
}

/// Debug data logged when a loop gives up at its iteration limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaxIterationsDiagnostic {
    pub max_iterations: i32,
    pub rule_set: Option<String>,
    pub source_document: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopOutcome {
    pub attributes: Vec<Attribute>,
    pub iterations: u32,
    pub exit: LoopExit,
    pub max_iterations_diagnostic: Option<MaxIterationsDiagnostic>,
}

/// Repeatedly applies a finding rule and a preprocessor to a copy of the document
/// while a condition holds, or a fixed number of times.
#[derive(Debug)]
pub struct LoopFinder {
    loop_type: LoopType,
    max_iterations: i32,
    log_exception_on_max_iterations: bool,
    condition_value: bool,
    finding_rule: Option<Box<dyn FindingRule>>,
    preprocessor: Option<Box<dyn Preprocessor>>,
    condition: Option<Box<dyn Condition>>,
    dirty: bool,
}

impl Default for LoopFinder {
    fn default() -> Self {
        Self {
            loop_type: LoopType::DoLoop,
            max_iterations: 10,
            log_exception_on_max_iterations: false,
            condition_value: true,
            finding_rule: None,
            preprocessor: None,
            condition: None,
            dirty: false,
        }
    }
}

impl LoopFinder {
    pub const COMPONENT_NAME: &'static str = "LoopFinder";
    pub const CURRENT_VERSION: i32 = 1;

    pub fn new(loop_type: LoopType, max_iterations: i32) -> Self {
        let mut finder = Self {
            max_iterations,
            ..Default::default()
        };
        finder.set_loop_type(loop_type);
        finder.dirty = false;
        finder
    }

    pub fn with_finding_rule(mut self, rule: Box<dyn FindingRule>) -> Self {
        self.set_finding_rule(rule);
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.set_preprocessor(preprocessor);
        self
    }

    pub fn with_condition(mut self, condition: Box<dyn Condition>) -> Self {
        self.set_condition(Some(condition));
        self
    }

    pub fn loop_type(&self) -> LoopType {
        self.loop_type
    }

    pub fn max_iterations(&self) -> i32 {
        self.max_iterations
    }

    pub fn log_exception_on_max_iterations(&self) -> bool {
        self.log_exception_on_max_iterations
    }

    pub fn condition_value(&self) -> bool {
        self.condition_value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn finding_rule(&self) -> Option<&dyn FindingRule> {
        self.finding_rule.as_deref()
    }

    pub fn preprocessor(&self) -> Option<&dyn Preprocessor> {
        self.preprocessor.as_deref()
    }

    pub fn condition(&self) -> Option<&dyn Condition> {
        self.condition.as_deref()
    }

    /// Switching to a for loop turns the max-iterations log off.
    pub fn set_loop_type(&mut self, loop_type: LoopType) {
        if self.loop_type != loop_type {
            self.loop_type = loop_type;
            self.dirty = true;
        }
        if loop_type == LoopType::ForLoop && self.log_exception_on_max_iterations {
            self.log_exception_on_max_iterations = false;
            self.dirty = true;
        }
    }

    pub fn set_max_iterations(&mut self, max_iterations: i32) {
        if self.max_iterations != max_iterations {
            self.max_iterations = max_iterations;
            self.dirty = true;
        }
    }

    /// Ignored (stays false) while the loop is a for loop.
    pub fn set_log_exception_on_max_iterations(&mut self, enabled: bool) {
        let enabled = enabled && self.loop_type.uses_condition();
        if self.log_exception_on_max_iterations != enabled {
            self.log_exception_on_max_iterations = enabled;
            self.dirty = true;
        }
    }

    pub fn set_condition_value(&mut self, value: bool) {
        if self.condition_value != value {
            self.condition_value = value;
            self.dirty = true;
        }
    }

    pub fn set_finding_rule(&mut self, rule: Box<dyn FindingRule>) {
        self.finding_rule = Some(rule);
        self.dirty = true;
    }

    pub fn set_preprocessor(&mut self, preprocessor: Box<dyn Preprocessor>) {
        self.preprocessor = Some(preprocessor);
        self.dirty = true;
    }

    pub fn set_condition(&mut self, condition: Option<Box<dyn Condition>>) {
        self.condition = condition;
        self.dirty = true;
    }

    /// Names the first missing or unconfigured piece.
    fn configuration_problem(&self) -> Option<String> {
        match self.finding_rule.as_deref() {
            None => return Some("no finding rule".into()),
            Some(rule) if !rule.is_configured() => {
                return Some(format!("finding rule {} is not configured", rule.component_name()));
            }
            _ => {}
        }
        match self.preprocessor.as_deref() {
            None => return Some("no preprocessor".into()),
            Some(pp) if !pp.is_configured() => {
                return Some(format!("preprocessor {} is not configured", pp.component_name()));
            }
            _ => {}
        }
        if self.max_iterations <= 0 {
            return Some(format!("max iterations must be positive (got {})", self.max_iterations));
        }
        if self.loop_type.uses_condition() {
            match self.condition.as_deref() {
                None => return Some(format!("a {} loop needs a condition", self.loop_type)),
                Some(c) if !c.is_configured() => {
                    return Some(format!("condition {} is not configured", c.component_name()));
                }
                _ => {}
            }
        }
        None
    }

    #[instrument(
        skip_all,
        fields(loop_type = %self.loop_type, max_iterations = self.max_iterations)
    )]
    pub fn run(&mut self, document: &Document) -> Result<LoopOutcome, FinderError> {
        if let Some(problem) = self.configuration_problem() {
            return Err(DomainError::not_configured(Self::COMPONENT_NAME, problem).into());
        }

        let loop_type = self.loop_type;
        let polarity = self.condition_value;
        let configured_max = self.max_iterations;
        let max_iterations = u32::try_from(configured_max).unwrap_or(0);
        let log_on_max = self.log_exception_on_max_iterations && loop_type.uses_condition();

        let Self {
            finding_rule,
            preprocessor,
            condition,
            ..
        } = &mut *self;
        let (Some(rule), Some(preprocessor)) = (finding_rule.as_deref_mut(), preprocessor.as_deref_mut())
        else {
            return Err(FinderError::Internal("configured loop lost its components".into()));
        };
        let mut condition = condition.as_deref_mut();

        // The loop mutates only its own copy.
        let mut working = document.clone();
        let mut attributes = Vec::new();
        let mut iterations: u32 = 0;

        let mut keep_going = match (loop_type, condition.as_deref_mut()) {
            (LoopType::WhileLoop, Some(c)) => c.process_condition(&working)? == polarity,
            _ => true,
        };

        while keep_going && iterations < max_iterations {
            let iteration = iterations + 1;
            let step = Self::run_iteration(
                rule,
                preprocessor,
                condition.as_deref_mut(),
                loop_type,
                &mut working,
                &mut attributes,
            );
            match step {
                Ok(condition_result) => {
                    iterations = iteration;
                    if let Some(result) = condition_result {
                        keep_going = result == polarity;
                    }
                }
                Err(source) => {
                    return Err(FinderError::Iteration {
                        iteration,
                        source: Box::new(source),
                    });
                }
            }
            debug!(iteration, attributes = attributes.len(), keep_going, "Loop iteration done");
        }

        let exit = if loop_type == LoopType::ForLoop {
            LoopExit::Completed
        } else if keep_going {
            LoopExit::MaxIterationsReached
        } else {
            LoopExit::ConditionFailed
        };

        let mut max_iterations_diagnostic = None;
        if exit == LoopExit::MaxIterationsReached && log_on_max {
            let diagnostic = MaxIterationsDiagnostic {
                max_iterations: configured_max,
                rule_set: document.rule_set_name.clone(),
                source_document: document.source_doc_name.clone(),
            };
            warn!(
                max_iterations = diagnostic.max_iterations,
                rule_set = diagnostic.rule_set.as_deref().unwrap_or(""),
                source_document = diagnostic.source_document.as_deref().unwrap_or(""),
                "Loop reached its maximum number of iterations before the condition was met"
            );
            max_iterations_diagnostic = Some(diagnostic);
        }

        Ok(LoopOutcome {
            attributes,
            iterations,
            exit,
            max_iterations_diagnostic,
        })
    }

    /// Body of one iteration; returns the re-evaluated condition, if the loop has one.
    fn run_iteration(
        rule: &mut dyn FindingRule,
        preprocessor: &mut dyn Preprocessor,
        condition: Option<&mut (dyn Condition + 'static)>,
        loop_type: LoopType,
        working: &mut Document,
        attributes: &mut Vec<Attribute>,
    ) -> Result<Option<bool>, FinderError> {
        attributes.extend(rule.parse_text(working)?);
        preprocessor.process(working)?;
        match (loop_type.uses_condition(), condition) {
            (true, Some(c)) => Ok(Some(c.process_condition(working)?)),
            _ => Ok(None),
        }
    }

    pub fn load(reader: &mut BlobReader<'_>, registry: &ComponentRegistry) -> Result<Self, FinderError> {
        let mut r = reader.read_framed(Self::COMPONENT_NAME)?;
        let version = r.read_i32()?;
        ensure_supported(Self::COMPONENT_NAME, Self::CURRENT_VERSION, version)?;

        let loop_type = LoopType::from_raw(r.read_i32()?)?;
        let max_iterations = r.read_i32()?;
        let log_exception_on_max_iterations = r.read_bool()? && loop_type.uses_condition();
        let condition_value = r.read_bool()?;

        let finding_rule = registry.read_finding_rule(&mut r)?;
        let preprocessor = registry.read_preprocessor(&mut r)?;
        let condition = if loop_type.uses_condition() {
            Some(registry.read_condition(&mut r)?)
        } else {
            None
        };

        Ok(Self {
            loop_type,
            max_iterations,
            log_exception_on_max_iterations,
            condition_value,
            finding_rule: Some(finding_rule),
            preprocessor: Some(preprocessor),
            condition,
            dirty: false,
        })
    }
}

impl Component for LoopFinder {
    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn is_configured(&self) -> bool {
        self.configuration_problem().is_none()
    }

    fn save(&self, writer: &mut BlobWriter) -> Result<(), FinderError> {
        if let Some(problem) = self.configuration_problem() {
            return Err(DomainError::not_configured(Self::COMPONENT_NAME, problem).into());
        }
        writer.write_framed(|w| {
            w.write_i32(Self::CURRENT_VERSION);
            w.write_i32(self.loop_type.as_raw());
            w.write_i32(self.max_iterations);
            w.write_bool(self.log_exception_on_max_iterations);
            w.write_bool(self.condition_value);

            if let Some(rule) = self.finding_rule.as_deref() {
                ComponentRegistry::write_component(w, rule)?;
            }
            if let Some(pp) = self.preprocessor.as_deref() {
                ComponentRegistry::write_component(w, pp)?;
            }
            match self.condition.as_deref() {
                Some(condition) if self.loop_type.uses_condition() => {
                    ComponentRegistry::write_component(w, condition)?;
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn describe(&self) -> String {
        let rule = self
            .finding_rule
            .as_deref()
            .map(|r| r.describe())
            .unwrap_or_else(|| "<no rule>".into());
        let pp = self
            .preprocessor
            .as_deref()
            .map(|p| p.describe())
            .unwrap_or_else(|| "<no preprocessor>".into());
        match (self.loop_type, self.condition.as_deref()) {
            (LoopType::ForLoop, _) => format!(
                "for loop x{} {{ {} ; {} }}",
                self.max_iterations, rule, pp
            ),
            (t, c) => format!(
                "{} loop (max {}) while [{}] == {} {{ {} ; {} }}",
                t,
                self.max_iterations,
                c.map(|c| c.describe()).unwrap_or_else(|| "<no condition>".into()),
                self.condition_value,
                rule,
                pp
            ),
        }
    }
}

impl FindingRule for LoopFinder {
    fn parse_text(&mut self, document: &Document) -> Result<Vec<Attribute>, FinderError> {
        Ok(self.run(document)?.attributes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::condition::{CharacterConfidenceCondition, ConditionalOp};
    use crate::domain::document::SpatialString;
    use crate::domain::rules::{NoOpPreprocessor, RegExprRule, Replacement, ReplaceStringsPreprocessor};
    use crate::ports::RuleServices;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Emits one attribute per call carrying the current document text.
    #[derive(Debug, Default)]
    struct EchoRule {
        calls: Rc<Cell<u32>>,
        fail_on_call: Option<u32>,
    }

    impl Component for EchoRule {
        fn component_name(&self) -> &'static str {
            "EchoRule"
        }
    }

    impl FindingRule for EchoRule {
        fn parse_text(&mut self, document: &Document) -> Result<Vec<Attribute>, FinderError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if self.fail_on_call == Some(call) {
                return Err(DomainError::InvalidDocument("boom".into()).into());
            }
            Ok(vec![Attribute::new(document.text().clone())])
        }
    }

    /// Appends a marker to the document on each call.
    #[derive(Debug, Default)]
    struct AppendPreprocessor;

    impl Component for AppendPreprocessor {
        fn component_name(&self) -> &'static str {
            "AppendPreprocessor"
        }
    }

    impl Preprocessor for AppendPreprocessor {
        fn process(&mut self, document: &mut Document) -> Result<(), FinderError> {
            let text = format!("{}+", document.text().as_str());
            document.set_text(SpatialString::text_only(text));
            Ok(())
        }
    }

    /// Replays scripted answers, repeating the last one.
    #[derive(Debug, Default)]
    struct ScriptedCondition {
        answers: Vec<bool>,
        calls: Rc<Cell<u32>>,
        seen: Rc<RefCell<Vec<String>>>,
        fail_on_call: Option<u32>,
    }

    impl Component for ScriptedCondition {
        fn component_name(&self) -> &'static str {
            "ScriptedCondition"
        }
    }

    impl Condition for ScriptedCondition {
        fn process_condition(&mut self, document: &Document) -> Result<bool, FinderError> {
            let index = self.calls.get() as usize;
            self.calls.set(self.calls.get() + 1);
            if self.fail_on_call == Some(self.calls.get()) {
                return Err(DomainError::InvalidDocument("condition failed".into()).into());
            }
            self.seen.borrow_mut().push(document.text().as_str().to_string());
            Ok(*self
                .answers
                .get(index)
                .or(self.answers.last())
                .unwrap_or(&false))
        }
    }

    fn echo(calls: &Rc<Cell<u32>>) -> Box<EchoRule> {
        Box::new(EchoRule {
            calls: calls.clone(),
            fail_on_call: None,
        })
    }

    fn scripted(answers: Vec<bool>, calls: &Rc<Cell<u32>>) -> Box<ScriptedCondition> {
        Box::new(ScriptedCondition {
            answers,
            calls: calls.clone(),
            seen: Rc::default(),
            fail_on_call: None,
        })
    }

    fn doc(text: &str) -> Document {
        Document::new(SpatialString::text_only(text))
            .with_source("/scans/doc1.tif")
            .with_rule_set("Loops")
    }

    #[test]
    fn test_for_loop_runs_exact_count_without_condition() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));

        let mut finder = LoopFinder::new(LoopType::DoLoop, 3)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(AppendPreprocessor))
            .with_condition(scripted(vec![true], &cond_calls));
        finder.set_log_exception_on_max_iterations(true);
        assert!(finder.log_exception_on_max_iterations());
        finder.set_loop_type(LoopType::ForLoop);
        assert!(!finder.log_exception_on_max_iterations());

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(rule_calls.get(), 3);
        assert_eq!(cond_calls.get(), 0);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.exit, LoopExit::Completed);
        assert!(outcome.max_iterations_diagnostic.is_none());
        let values: Vec<&str> = outcome.attributes.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["x", "x+", "x++"]);
        Ok(())
    }

    #[test]
    fn test_for_loop_rejects_log_flag() {
        let mut finder = LoopFinder::new(LoopType::ForLoop, 3);
        finder.set_log_exception_on_max_iterations(true);
        assert!(!finder.log_exception_on_max_iterations());
    }

    #[test]
    fn test_do_loop_hits_max_and_logs() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::DoLoop, 5)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![true], &cond_calls));
        finder.set_log_exception_on_max_iterations(true);

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(rule_calls.get(), 5);
        assert_eq!(outcome.exit, LoopExit::MaxIterationsReached);
        assert_eq!(
            outcome.max_iterations_diagnostic,
            Some(MaxIterationsDiagnostic {
                max_iterations: 5,
                rule_set: Some("Loops".into()),
                source_document: Some("/scans/doc1.tif".into()),
            })
        );
        Ok(())
    }

    #[test]
    fn test_do_loop_hits_max_silently_without_flag() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::DoLoop, 5)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![true], &cond_calls));

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(rule_calls.get(), 5);
        assert_eq!(outcome.exit, LoopExit::MaxIterationsReached);
        assert!(outcome.max_iterations_diagnostic.is_none());
        Ok(())
    }

    #[test]
    fn test_do_loop_runs_body_before_first_check() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::DoLoop, 5)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![false], &cond_calls));

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(rule_calls.get(), 1);
        assert_eq!(cond_calls.get(), 1);
        assert_eq!(outcome.exit, LoopExit::ConditionFailed);
        Ok(())
    }

    #[test]
    fn test_while_loop_can_run_zero_times() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::WhileLoop, 5)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![false], &cond_calls));

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(rule_calls.get(), 0);
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.attributes.is_empty());
        assert_eq!(outcome.exit, LoopExit::ConditionFailed);
        Ok(())
    }

    #[test]
    fn test_condition_sees_preprocessed_copy_and_original_is_untouched() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let condition = scripted(vec![true, true, false], &cond_calls);
        let seen = condition.seen.clone();

        let mut finder = LoopFinder::new(LoopType::WhileLoop, 10)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(AppendPreprocessor))
            .with_condition(condition);

        let input = doc("x");
        let outcome = finder.run(&input)?;
        assert_eq!(outcome.iterations, 2);
        assert_eq!(*seen.borrow(), vec!["x", "x+", "x++"]);
        assert_eq!(input.text().as_str(), "x");
        Ok(())
    }

    #[test]
    fn test_inverted_polarity_continues_while_false() -> anyhow::Result<()> {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::DoLoop, 10)
            .with_finding_rule(echo(&rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![false, false, true], &cond_calls));
        finder.set_condition_value(false);

        let outcome = finder.run(&doc("x"))?;
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.exit, LoopExit::ConditionFailed);
        Ok(())
    }

    #[test]
    fn test_body_error_is_annotated_and_propagated() {
        let rule_calls = Rc::new(Cell::new(0));
        let cond_calls = Rc::new(Cell::new(0));
        let mut finder = LoopFinder::new(LoopType::DoLoop, 10)
            .with_finding_rule(Box::new(EchoRule {
                calls: rule_calls.clone(),
                fail_on_call: Some(3),
            }))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(scripted(vec![true], &cond_calls));
        finder.set_log_exception_on_max_iterations(true);

        let err = finder.run(&doc("x")).unwrap_err();
        assert_eq!(err.iteration(), Some(3));
        assert!(matches!(
            err,
            FinderError::Iteration { ref source, .. }
                if matches!(**source, FinderError::Domain(DomainError::InvalidDocument(_)))
        ));
    }

    #[test]
    fn test_configuration_requirements() {
        let calls = Rc::new(Cell::new(0));

        let missing_rule = LoopFinder::new(LoopType::ForLoop, 3).with_preprocessor(Box::new(NoOpPreprocessor));
        assert!(!missing_rule.is_configured());

        let for_loop = LoopFinder::new(LoopType::ForLoop, 3)
            .with_finding_rule(echo(&calls))
            .with_preprocessor(Box::new(NoOpPreprocessor));
        assert!(for_loop.is_configured());

        let mut do_loop = LoopFinder::new(LoopType::DoLoop, 3)
            .with_finding_rule(echo(&calls))
            .with_preprocessor(Box::new(NoOpPreprocessor));
        assert!(!do_loop.is_configured());
        do_loop.set_condition(Some(scripted(vec![true], &calls)));
        assert!(do_loop.is_configured());
        do_loop.set_max_iterations(0);
        assert!(!do_loop.is_configured());

        let unconfigured_inner = LoopFinder::new(LoopType::ForLoop, 3)
            .with_finding_rule(Box::new(RegExprRule::new("")))
            .with_preprocessor(Box::new(NoOpPreprocessor));
        assert!(!unconfigured_inner.is_configured());

        let unconfigured_pp = LoopFinder::new(LoopType::ForLoop, 3)
            .with_finding_rule(echo(&calls))
            .with_preprocessor(Box::new(ReplaceStringsPreprocessor::default()));
        assert!(!unconfigured_pp.is_configured());
    }

    fn failing_while_loop(rule_calls: &Rc<Cell<u32>>, fail_on_call: u32) -> LoopFinder {
        LoopFinder::new(LoopType::WhileLoop, 5)
            .with_finding_rule(echo(rule_calls))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(Box::new(ScriptedCondition {
                answers: vec![true],
                fail_on_call: Some(fail_on_call),
                ..Default::default()
            }))
    }

    #[test]
    fn test_while_precheck_error_is_returned_unwrapped() {
        let rule_calls = Rc::new(Cell::new(0));
        let mut finder = failing_while_loop(&rule_calls, 1);

        let err = finder.run(&doc("x")).unwrap_err();
        assert_eq!(err.iteration(), None);
        assert!(matches!(
            err,
            FinderError::Domain(DomainError::InvalidDocument(_))
        ));
        assert_eq!(rule_calls.get(), 0);
    }

    #[test]
    fn test_while_recheck_error_carries_iteration() {
        let rule_calls = Rc::new(Cell::new(0));
        // Call 1 is the pre-check; call 3 is the re-check after iteration 2.
        let mut finder = failing_while_loop(&rule_calls, 3);

        let err = finder.run(&doc("x")).unwrap_err();
        assert_eq!(err.iteration(), Some(2));
        assert_eq!(rule_calls.get(), 2);
    }

    #[test]
    fn test_run_unconfigured_is_configuration_error() {
        let mut finder = LoopFinder::new(LoopType::WhileLoop, 3);
        let err = finder.run(&doc("x")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_dirty_flag_tracks_the_field_being_set() {
        let mut finder = LoopFinder::new(LoopType::DoLoop, 3);
        assert!(!finder.is_dirty());
        // condition_value is true by default; setting the log flag must still mark dirty
        finder.set_log_exception_on_max_iterations(true);
        assert!(finder.is_dirty());
    }

    #[test]
    fn test_nested_round_trip_and_behaviour() -> anyhow::Result<()> {
        let mut rule = RegExprRule::new(r"\d+");
        rule.set_case_sensitive(true);
        let mut finder = LoopFinder::new(LoopType::WhileLoop, 4)
            .with_finding_rule(Box::new(rule))
            .with_preprocessor(Box::new(ReplaceStringsPreprocessor::new(
                vec![Replacement::new(r"^\D*\d+", "")],
                false,
            )))
            .with_condition(Box::new(CharacterConfidenceCondition::new(ConditionalOp::Gt, 0)));
        finder.set_log_exception_on_max_iterations(true);

        let bytes = ComponentRegistry::to_bytes(&finder)?;
        let registry = ComponentRegistry::with_builtins(RuleServices::default());
        let mut loaded = registry.read_finding_rule(&mut BlobReader::new(&bytes, "blob"))?;
        assert_eq!(loaded.describe(), finder.describe());

        // Each pass extracts every remaining number, then strips the first one.
        let found = loaded.parse_text(&doc("a1 b22 c333"))?;
        let values: Vec<&str> = found.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["1", "22", "333", "22", "333", "333"]);
        Ok(())
    }

    #[test]
    fn test_for_loop_blob_has_no_condition() -> anyhow::Result<()> {
        let finder = LoopFinder::new(LoopType::ForLoop, 2)
            .with_finding_rule(Box::new(RegExprRule::new("a")))
            .with_preprocessor(Box::new(NoOpPreprocessor))
            .with_condition(Box::new(CharacterConfidenceCondition::new(ConditionalOp::Gt, 0)));
        let bytes = ComponentRegistry::to_bytes(&finder)?;
        let loaded = LoopFinder::load(
            &mut {
                let mut r = BlobReader::new(&bytes, "blob");
                r.read_string()?;
                r
            },
            &ComponentRegistry::with_builtins(RuleServices::default()),
        )?;
        assert!(loaded.condition().is_none());
        assert_eq!(loaded.loop_type(), LoopType::ForLoop);
        assert!(!loaded.log_exception_on_max_iterations());
        Ok(())
    }

    #[test]
    fn test_unsaveable_component_is_reported() {
        let calls = Rc::new(Cell::new(0));
        let finder = LoopFinder::new(LoopType::ForLoop, 2)
            .with_finding_rule(echo(&calls))
            .with_preprocessor(Box::new(NoOpPreprocessor));
        let res = ComponentRegistry::to_bytes(&finder);
        assert!(matches!(
            res,
            Err(FinderError::Domain(DomainError::NotPersistable("EchoRule")))
        ));
    }
}
