// attrfind-core/src/domain/scoring/entity_scorer.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::cache::FileCache;
use crate::domain::document::Attribute;
use crate::domain::scoring::word_lists::{
    COMMON_WORDS_FILE, CommonWords, INVALID_PERSON_WORDS_FILE, InvalidPersonWords,
};
use crate::error::FinderError;
use crate::ports::ResourceLoader;

/// Upper bound of every public score and of aggregated totals.
pub const MAX_SCORE: i32 = 100;

/// Internal points are 0..=10; public scores are this many times larger.
const SCALE: i32 = 10;
const CLAMP_THRESHOLD: i32 = 8;
const MAX_POINTS: i32 = 10;

fn fixed_regex(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(source).unwrap_or_else(|_| {
            // hardcoded patterns; fall back to a regex that never matches text
            Regex::new(r"\z\A.").unwrap_or_else(|_| unreachable!())
        })
    })
}

fn embedded_digit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    fixed_regex(&RE, r"[A-Za-z]\d|\d[A-Za-z]")
}

fn company_designator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    fixed_regex(
        &RE,
        r"(?i)\b(?:inc|corp|corporation|company|co|llc|ltd|bank|trust|association|partners)\b",
    )
}

fn person_designator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    fixed_regex(
        &RE,
        r"(?i)\b(?:husband|wife|trustee|heirs|estate of|executor|executrix|personal representative)\b",
    )
}

fn alias_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    fixed_regex(&RE, r"(?i)\b(?:a/k/a|aka|f/k/a|fka|n/k/a|nka)\b")
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_consonant(c: char) -> bool {
    c.is_alphabetic() && !is_vowel(c)
}

fn is_company_char(c: char) -> bool {
    c.is_alphabetic()
        || c.is_ascii_digit()
        || matches!(c, '&' | '*' | '-' | ',' | '.' | '\'' | ' ' | '\r' | '\n')
}

fn is_person_char(c: char) -> bool {
    c.is_alphabetic() || c.is_whitespace() || matches!(c, '.' | ',' | '\'' | '-')
}

fn longest_run(text: &str, pred: impl Fn(char) -> bool) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if pred(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn title_case_ratio(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let titled = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    titled as f64 / words.len() as f64
}

fn has_vowels_and_consonants(text: &str) -> bool {
    text.chars().any(is_vowel) && text.chars().any(is_consonant)
}

fn clamp_points(points: i32) -> i32 {
    if points >= CLAMP_THRESHOLD {
        MAX_POINTS
    } else {
        points
    }
}

/// Company points on the 0..=10 scale.
fn company_points(candidate: &str, original: &str, common: &CommonWords) -> i32 {
    let value = candidate.trim();
    if value.chars().count() < 4 || common.is_all_common(value) || !value.chars().all(is_company_char) {
        return 0;
    }

    let words: Vec<&str> = value.split_whitespace().collect();
    let mut points = 1;
    if title_case_ratio(&words) > 0.5 {
        points += 2;
    }
    if has_vowels_and_consonants(value) {
        points += 2;
    }
    if longest_run(value, is_vowel) < 4
        && longest_run(value, |c| !is_vowel(c) && !c.is_whitespace()) < 4
    {
        points += 2;
    }
    if embedded_digit().find_iter(value).count() <= 2 {
        points += 1;
    }
    if (2..=9).contains(&words.len()) {
        points += 1;
    }
    if company_designator().is_match(original) {
        points += 1;
    }
    clamp_points(points)
}

/// Person points on the 0..=10 scale.
fn person_points(
    person: &Attribute,
    original: &str,
    common: &CommonWords,
    invalid: &InvalidPersonWords,
) -> i32 {
    let value = person.value.as_str().trim();
    let words: Vec<&str> = value.split_whitespace().collect();
    if value.chars().count() < 4
        || words.len() < 2
        || words.iter().any(|w| invalid.contains(w))
        || !value.chars().all(is_person_char)
    {
        return 0;
    }

    let mut points = 1;
    if title_case_ratio(&words) > 0.5 {
        points += 1;
    }
    if has_vowels_and_consonants(value) {
        points += 1;
    }
    if longest_run(value, is_vowel) < 4 && longest_run(value, is_consonant) < 5 {
        points += 1;
    }
    match person.find_sub_attribute("Middle") {
        None => points += 1,
        Some(middle) if middle.value.as_str().split_whitespace().count() < 3 => points += 1,
        Some(_) => {}
    }
    for part in ["First", "Last"] {
        let counts = person
            .find_sub_attribute(part)
            .is_some_and(|name| !common.is_all_common(name.value.as_str()));
        if counts {
            points += 1;
        }
    }
    if person.has_sub_attribute("Title") || person.has_sub_attribute("Suffix") {
        points += 1;
    }
    if person_designator().is_match(original) || alias_marker().is_match(original) {
        points += 1;
    }
    clamp_points(points)
}

/// Which scorer an attribute is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Company,
    Person,
}

impl EntityKind {
    /// Attribute type first; untyped attributes with name parts are people.
    pub fn of(attribute: &Attribute) -> Self {
        if attribute.attribute_type.eq_ignore_ascii_case("Company") {
            Self::Company
        } else if attribute.attribute_type.eq_ignore_ascii_case("Person")
            || ["First", "Last", "Middle"]
                .iter()
                .any(|part| attribute.has_sub_attribute(part))
        {
            Self::Person
        } else {
            Self::Company
        }
    }
}

/// Sums scores, clamping at [`MAX_SCORE`]. Stops scoring once the cap is reached.
pub fn aggregate_scores<I, F>(items: I, mut score: F) -> Result<i32, FinderError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<i32, FinderError>,
{
    let mut total = 0;
    for item in items {
        if total >= MAX_SCORE {
            break;
        }
        total = (total + score(item)?).min(MAX_SCORE);
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerSettings {
    /// Directory holding `common_words.txt` and `invalid_person_words.txt`.
    pub data_dir: PathBuf,
    /// Re-check word-list timestamps on every use.
    #[serde(default = "default_check_for_updates")]
    pub check_for_updates: bool,
}

fn default_check_for_updates() -> bool {
    true
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            check_for_updates: true,
        }
    }
}

/// Heuristic plausibility scores (0..=100) for company and person names.
pub struct EntityScorer {
    settings: ScorerSettings,
    loader: Arc<dyn ResourceLoader>,
    common_words: FileCache<CommonWords>,
    invalid_person_words: FileCache<InvalidPersonWords>,
}

impl fmt::Debug for EntityScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityScorer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl EntityScorer {
    pub fn new(settings: ScorerSettings, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            settings,
            loader,
            common_words: FileCache::new(),
            invalid_person_words: FileCache::new(),
        }
    }

    pub fn settings(&self) -> &ScorerSettings {
        &self.settings
    }

    fn common_words(&mut self) -> Result<&CommonWords, FinderError> {
        let Self {
            settings,
            loader,
            common_words,
            ..
        } = self;
        common_words.get_or_load(
            loader.as_ref(),
            &settings.data_dir.join(COMMON_WORDS_FILE),
            settings.check_for_updates,
            |content| CommonWords::parse(&content),
        )
    }

    fn word_lists(&mut self) -> Result<(&CommonWords, &InvalidPersonWords), FinderError> {
        let Self {
            settings,
            loader,
            common_words,
            invalid_person_words,
        } = self;
        let common = common_words.get_or_load(
            loader.as_ref(),
            &settings.data_dir.join(COMMON_WORDS_FILE),
            settings.check_for_updates,
            |content| CommonWords::parse(&content),
        )?;
        let invalid = invalid_person_words.get_or_load(
            loader.as_ref(),
            &settings.data_dir.join(INVALID_PERSON_WORDS_FILE),
            settings.check_for_updates,
            |content| InvalidPersonWords::parse(&content),
        )?;
        Ok((common, invalid))
    }

    #[instrument(skip(self))]
    pub fn score_company(&mut self, candidate: &str, original: &str) -> Result<i32, FinderError> {
        let common = self.common_words()?;
        let points = company_points(candidate, original, common);
        debug!(points, "Company scored");
        Ok(points * SCALE)
    }

    #[instrument(skip(self, person), fields(person = %person.value))]
    pub fn score_person(&mut self, person: &Attribute, original: &str) -> Result<i32, FinderError> {
        let (common, invalid) = self.word_lists()?;
        let points = person_points(person, original, common, invalid);
        debug!(points, "Person scored");
        Ok(points * SCALE)
    }

    /// Routes by [`EntityKind::of`]; the attribute's own text is the original.
    pub fn score_attribute(&mut self, attribute: &Attribute) -> Result<i32, FinderError> {
        let original = attribute.value.as_str();
        match EntityKind::of(attribute) {
            EntityKind::Company => self.score_company(original, original),
            EntityKind::Person => self.score_person(attribute, original),
        }
    }

    pub fn score_attributes(&mut self, attributes: &[Attribute]) -> Result<i32, FinderError> {
        aggregate_scores(attributes, |a| self.score_attribute(a))
    }
}
