// attrfind-core/src/domain/persistence/registry.rs

use std::collections::HashMap;

use crate::domain::condition::CharacterConfidenceCondition;
use crate::domain::error::DomainError;
use crate::domain::persistence::{BlobReader, BlobWriter};
use crate::domain::ports::{Component, Condition, FindingRule, Preprocessor};
use crate::domain::rules::{LoopFinder, NoOpPreprocessor, RegExprRule, ReplaceStringsPreprocessor};
use crate::error::FinderError;
use crate::ports::RuleServices;

/// Frames a nested component may sit under before the blob is rejected.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A component restored from a nested blob, tagged by the role it plays.
#[derive(Debug)]
pub enum LoadedComponent {
    FindingRule(Box<dyn FindingRule>),
    Preprocessor(Box<dyn Preprocessor>),
    Condition(Box<dyn Condition>),
}

impl LoadedComponent {
    fn role(&self) -> &'static str {
        match self {
            Self::FindingRule(_) => "finding rule",
            Self::Preprocessor(_) => "preprocessor",
            Self::Condition(_) => "condition",
        }
    }
}

pub type FindingRuleLoader =
    fn(&mut BlobReader<'_>, &ComponentRegistry) -> Result<Box<dyn FindingRule>, FinderError>;
pub type PreprocessorLoader =
    fn(&mut BlobReader<'_>, &ComponentRegistry) -> Result<Box<dyn Preprocessor>, FinderError>;
pub type ConditionLoader =
    fn(&mut BlobReader<'_>, &ComponentRegistry) -> Result<Box<dyn Condition>, FinderError>;

#[derive(Clone, Copy)]
enum Loader {
    FindingRule(FindingRuleLoader),
    Preprocessor(PreprocessorLoader),
    Condition(ConditionLoader),
}

/// Maps class names found in nested blobs back to loaders.
/// Rules restored through the registry share its services.
pub struct ComponentRegistry {
    loaders: HashMap<&'static str, Loader>,
    services: RuleServices,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.loaders.keys().collect();
        names.sort();
        f.debug_struct("ComponentRegistry")
            .field("components", &names)
            .field("services", &self.services)
            .finish()
    }
}

impl ComponentRegistry {
    pub fn empty(services: RuleServices) -> Self {
        Self {
            loaders: HashMap::new(),
            services,
        }
    }

    pub fn with_builtins(services: RuleServices) -> Self {
        let mut registry = Self::empty(services);
        registry.register_finding_rule(RegExprRule::COMPONENT_NAME, |r, reg| {
            let rule = RegExprRule::load(r)?.with_services(reg.services().clone());
            Ok(Box::new(rule))
        });
        registry.register_finding_rule(LoopFinder::COMPONENT_NAME, |r, reg| {
            Ok(Box::new(LoopFinder::load(r, reg)?))
        });
        registry.register_condition(CharacterConfidenceCondition::COMPONENT_NAME, |r, _| {
            Ok(Box::new(CharacterConfidenceCondition::load(r)?))
        });
        registry.register_preprocessor(ReplaceStringsPreprocessor::COMPONENT_NAME, |r, _| {
            Ok(Box::new(ReplaceStringsPreprocessor::load(r)?))
        });
        registry.register_preprocessor(NoOpPreprocessor::COMPONENT_NAME, |r, _| {
            Ok(Box::new(NoOpPreprocessor::load(r)?))
        });
        registry
    }

    pub fn with_services(mut self, services: RuleServices) -> Self {
        self.services = services;
        self
    }

    pub fn services(&self) -> &RuleServices {
        &self.services
    }

    pub fn register_finding_rule(&mut self, component_name: &'static str, loader: FindingRuleLoader) {
        self.loaders.insert(component_name, Loader::FindingRule(loader));
    }

    pub fn register_preprocessor(&mut self, component_name: &'static str, loader: PreprocessorLoader) {
        self.loaders.insert(component_name, Loader::Preprocessor(loader));
    }

    pub fn register_condition(&mut self, component_name: &'static str, loader: ConditionLoader) {
        self.loaders.insert(component_name, Loader::Condition(loader));
    }

    pub fn is_registered(&self, component_name: &str) -> bool {
        self.loaders.contains_key(component_name)
    }

    /// Writes `[string className][framed blob]`.
    pub fn write_component<C>(writer: &mut BlobWriter, component: &C) -> Result<(), FinderError>
    where
        C: Component + ?Sized,
    {
        writer.write_string(component.component_name())?;
        component.save(writer)
    }

    pub fn read_component(&self, reader: &mut BlobReader<'_>) -> Result<LoadedComponent, FinderError> {
        if reader.depth() > MAX_NESTING_DEPTH {
            return Err(DomainError::corrupt(
                reader.component(),
                format!("components nested deeper than {}", MAX_NESTING_DEPTH),
            )
            .into());
        }
        let name = reader.read_string()?;
        let loader = self.loaders.get(name.as_str()).ok_or_else(|| {
            DomainError::corrupt(
                reader.component(),
                format!("unknown nested component '{}'", name),
            )
        })?;
        Ok(match *loader {
            Loader::FindingRule(load) => LoadedComponent::FindingRule(load(reader, self)?),
            Loader::Preprocessor(load) => LoadedComponent::Preprocessor(load(reader, self)?),
            Loader::Condition(load) => LoadedComponent::Condition(load(reader, self)?),
        })
    }

    pub fn read_finding_rule(
        &self,
        reader: &mut BlobReader<'_>,
    ) -> Result<Box<dyn FindingRule>, FinderError> {
        match self.read_component(reader)? {
            LoadedComponent::FindingRule(rule) => Ok(rule),
            other => Err(Self::role_mismatch(reader, "finding rule", &other)),
        }
    }

    pub fn read_preprocessor(
        &self,
        reader: &mut BlobReader<'_>,
    ) -> Result<Box<dyn Preprocessor>, FinderError> {
        match self.read_component(reader)? {
            LoadedComponent::Preprocessor(pp) => Ok(pp),
            other => Err(Self::role_mismatch(reader, "preprocessor", &other)),
        }
    }

    pub fn read_condition(
        &self,
        reader: &mut BlobReader<'_>,
    ) -> Result<Box<dyn Condition>, FinderError> {
        match self.read_component(reader)? {
            LoadedComponent::Condition(condition) => Ok(condition),
            other => Err(Self::role_mismatch(reader, "condition", &other)),
        }
    }

    fn role_mismatch(
        reader: &BlobReader<'_>,
        expected: &str,
        found: &LoadedComponent,
    ) -> FinderError {
        DomainError::corrupt(
            reader.component(),
            format!("expected a {}, found a {}", expected, found.role()),
        )
        .into()
    }

    /// Serializes a top-level finding rule into a standalone blob.
    pub fn to_bytes<C>(component: &C) -> Result<Vec<u8>, FinderError>
    where
        C: Component + ?Sized,
    {
        let mut writer = BlobWriter::new();
        Self::write_component(&mut writer, component)?;
        Ok(writer.into_bytes())
    }

    pub fn from_bytes(&self, bytes: &[u8]) -> Result<LoadedComponent, FinderError> {
        let mut reader = BlobReader::new(bytes, "blob");
        self.read_component(&mut reader)
    }
}
