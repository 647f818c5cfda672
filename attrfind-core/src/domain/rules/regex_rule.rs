// attrfind-core/src/domain/rules/regex_rule.rs

use std::path::PathBuf;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::domain::cache::FileCache;
use crate::domain::document::{Attribute, Document, SpatialString};
use crate::domain::error::DomainError;
use crate::domain::persistence::{BlobReader, BlobWriter, ensure_supported};
use crate::domain::ports::{Component, FindingRule};
use crate::error::FinderError;
use crate::ports::RuleServices;

/// Compiles a pattern the way every regex rule does (case folding is the only knob).
pub fn compile_pattern(pattern: &str, case_sensitive: bool) -> Result<Regex, DomainError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| DomainError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Name given to the sub-attribute of a capture group, or `None` when it is skipped.
fn sub_attribute_name(group_name: &str, value_is_empty: bool) -> Option<String> {
    if group_name.is_empty() || group_name.starts_with('_') {
        return None;
    }
    let numeric = group_name.chars().all(|c| c.is_ascii_digit());
    if numeric {
        // Auto-numbered groups must not collide with semantic names.
        if value_is_empty {
            return None;
        }
        return Some(format!("Capture{}", group_name));
    }
    Some(group_name.to_string())
}

/// One attribute per match; optionally one sub-attribute per capture group.
/// Zero matches is an empty list, not an error.
pub fn find_matches(regex: &Regex, input: &SpatialString, create_sub_attributes: bool) -> Vec<Attribute> {
    let mut attributes = Vec::new();

    for caps in regex.captures_iter(input.as_str()) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let mut attribute = Attribute::new(input.substring(whole.start(), whole.end()));

        if create_sub_attributes {
            for (index, name) in regex.capture_names().enumerate().skip(1) {
                let group_name = match name {
                    Some(n) => n.to_string(),
                    None => index.to_string(),
                };
                // A group that did not take part in the match has no position: text-only empty value.
                let value = match caps.get(index) {
                    Some(m) => input.substring(m.start(), m.end()),
                    None => SpatialString::text_only(""),
                };
                if let Some(child_name) = sub_attribute_name(&group_name, value.is_empty()) {
                    attribute.push_sub_attribute(Attribute::new(value).with_name(child_name));
                }
            }
        }

        attributes.push(attribute);
    }

    attributes
}

/// Literal whitespace was allowed in patterns saved before version 3;
/// it is rewritten into explicit escapes on load.
pub fn escape_literal_whitespace(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            ' ' => escaped.push_str(r"\x20"),
            '\r' => escaped.push_str(r"\r"),
            '\n' => escaped.push_str(r"\n"),
            '\t' => escaped.push_str(r"\t"),
            '\x0C' => escaped.push_str(r"\x0C"),
            '\x0B' => escaped.push_str(r"\x0B"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Pattern files: `//` comment lines are dropped, the rest is joined without line breaks.
fn parse_pattern_file(content: String) -> Result<String, FinderError> {
    Ok(content
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join(""))
}

#[derive(Debug)]
struct CompiledPattern {
    source: String,
    case_sensitive: bool,
    regex: Regex,
}

/// Finding rule that turns regular expression matches into attributes.
#[derive(Debug)]
pub struct RegExprRule {
    pattern: String,
    is_from_file: bool,
    file_name: String,
    case_sensitive: bool,
    create_sub_attributes: bool,
    dirty: bool,
    services: Option<RuleServices>,
    pattern_file: FileCache<String>,
    compiled: Option<CompiledPattern>,
}

impl Default for RegExprRule {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            is_from_file: false,
            file_name: String::new(),
            case_sensitive: false,
            create_sub_attributes: false,
            dirty: false,
            services: None,
            pattern_file: FileCache::new(),
            compiled: None,
        }
    }
}

impl RegExprRule {
    pub const COMPONENT_NAME: &'static str = "RegExprRule";
    pub const CURRENT_VERSION: i32 = 4;

    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn from_file(file_name: impl Into<String>) -> Self {
        Self {
            is_from_file: true,
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    pub fn with_services(mut self, services: RuleServices) -> Self {
        self.services = Some(services);
        self.pattern_file.invalidate();
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_from_file(&self) -> bool {
        self.is_from_file
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn creates_sub_attributes(&self) -> bool {
        self.create_sub_attributes
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if self.pattern != pattern {
            self.pattern = pattern;
            self.dirty = true;
        }
    }

    pub fn set_is_from_file(&mut self, is_from_file: bool) {
        if self.is_from_file != is_from_file {
            self.is_from_file = is_from_file;
            self.dirty = true;
        }
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        let file_name = file_name.into();
        if self.file_name != file_name {
            self.file_name = file_name;
            self.pattern_file.invalidate();
            self.dirty = true;
        }
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        if self.case_sensitive != case_sensitive {
            self.case_sensitive = case_sensitive;
            self.dirty = true;
        }
    }

    pub fn set_create_sub_attributes(&mut self, enabled: bool) {
        if self.create_sub_attributes != enabled {
            self.create_sub_attributes = enabled;
            self.dirty = true;
        }
    }

    /// Resolves the pattern text: inline, or loaded (and cached) from the tagged file name.
    fn resolve_pattern(&mut self, document: &Document) -> Result<String, FinderError> {
        if !self.is_from_file {
            return Ok(self.pattern.clone());
        }

        let services = self.services.as_ref().ok_or_else(|| {
            DomainError::not_configured(
                Self::COMPONENT_NAME,
                format!("no resource services to read pattern file '{}'", self.file_name),
            )
        })?;
        let expanded = services.tags.expand(&self.file_name, &document.tag_context())?;
        let path = PathBuf::from(expanded);
        let pattern = self
            .pattern_file
            .get_or_load(services.loader.as_ref(), &path, true, parse_pattern_file)?;

        if pattern.trim().is_empty() {
            return Err(DomainError::not_configured(
                Self::COMPONENT_NAME,
                format!("pattern file '{}' contains no pattern", path.display()),
            )
            .into());
        }
        Ok(pattern.clone())
    }

    fn compiled_regex(&mut self, source: String) -> Result<&Regex, FinderError> {
        let reuse = self
            .compiled
            .as_ref()
            .is_some_and(|c| c.source == source && c.case_sensitive == self.case_sensitive);

        if !reuse {
            let regex = compile_pattern(&source, self.case_sensitive)?;
            self.compiled = Some(CompiledPattern {
                source,
                case_sensitive: self.case_sensitive,
                regex,
            });
        }

        self.compiled
            .as_ref()
            .map(|c| &c.regex)
            .ok_or_else(|| FinderError::Internal("regex cache is empty after compile".into()))
    }

    pub fn load(reader: &mut BlobReader<'_>) -> Result<Self, FinderError> {
        let mut r = reader.read_framed(Self::COMPONENT_NAME)?;
        let version = r.read_i32()?;
        ensure_supported(Self::COMPONENT_NAME, Self::CURRENT_VERSION, version)?;

        let case_sensitive = r.read_bool()?;
        let mut pattern = r.read_string()?;

        let (is_from_file, file_name) = if version >= 2 {
            (r.read_bool()?, r.read_string()?)
        } else {
            (false, String::new())
        };

        let create_sub_attributes = if version >= 4 { r.read_bool()? } else { false };

        if version < 3 {
            pattern = escape_literal_whitespace(&pattern);
        }

        Ok(Self {
            pattern,
            is_from_file,
            file_name,
            case_sensitive,
            create_sub_attributes,
            ..Default::default()
        })
    }
}

impl Component for RegExprRule {
    fn component_name(&self) -> &'static str {
        Self::COMPONENT_NAME
    }

    fn is_configured(&self) -> bool {
        if self.is_from_file {
            !self.file_name.trim().is_empty()
        } else {
            !self.pattern.is_empty()
        }
    }

    fn save(&self, writer: &mut BlobWriter) -> Result<(), FinderError> {
        writer.write_framed(|w| {
            w.write_i32(Self::CURRENT_VERSION);
            w.write_bool(self.case_sensitive);
            w.write_string(&self.pattern)?;
            w.write_bool(self.is_from_file);
            w.write_string(&self.file_name)?;
            w.write_bool(self.create_sub_attributes);
            Ok(())
        })
    }

    fn describe(&self) -> String {
        if self.is_from_file {
            format!("regex from file '{}'", self.file_name)
        } else {
            format!("regex /{}/", self.pattern)
        }
    }
}

impl FindingRule for RegExprRule {
    fn parse_text(&mut self, document: &Document) -> Result<Vec<Attribute>, FinderError> {
        if !self.is_configured() {
            let reason = if self.is_from_file {
                "no pattern file name"
            } else {
                "empty pattern"
            };
            return Err(DomainError::not_configured(Self::COMPONENT_NAME, reason).into());
        }

        let source = self.resolve_pattern(document)?;
        let create_sub_attributes = self.create_sub_attributes;
        let regex = self.compiled_regex(source)?;
        let attributes = find_matches(regex, document.text(), create_sub_attributes);
        debug!(matches = attributes.len(), "Regex rule evaluated");
        Ok(attributes)
    }
}
