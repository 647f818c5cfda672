// attrfind-core/src/domain/scoring/word_lists.rs

use regex::Regex;

use crate::domain::error::DomainError;
use crate::error::FinderError;

pub const COMMON_WORDS_FILE: &str = "common_words.txt";
pub const INVALID_PERSON_WORDS_FILE: &str = "invalid_person_words.txt";

fn entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
}

/// Words and phrases that carry no identifying weight on their own ("the", "of", "county").
#[derive(Debug, Default)]
pub struct CommonWords {
    pattern: Option<Regex>,
}

impl CommonWords {
    /// One word or phrase per line; `//` lines are comments.
    pub fn parse(content: &str) -> Result<Self, FinderError> {
        let alternatives: Vec<String> = entries(content).map(regex::escape).collect();
        if alternatives.is_empty() {
            return Ok(Self::default());
        }
        let source = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
        let pattern = Regex::new(&source).map_err(|e| DomainError::InvalidPattern {
            pattern: COMMON_WORDS_FILE.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// True when nothing alphanumeric survives once common words are stripped.
    pub fn is_all_common(&self, text: &str) -> bool {
        let stripped = match &self.pattern {
            Some(pattern) => pattern.replace_all(text, ""),
            None => text.into(),
        };
        !stripped.chars().any(char::is_alphanumeric)
    }
}

/// Words that never appear in a person's name ("llc", "street", ...). Sorted for binary search.
#[derive(Debug, Default)]
pub struct InvalidPersonWords {
    words: Vec<String>,
}

impl InvalidPersonWords {
    pub fn parse(content: &str) -> Result<Self, FinderError> {
        let mut words: Vec<String> = entries(content).map(str::to_lowercase).collect();
        words.sort();
        words.dedup();
        Ok(Self { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-insensitive; surrounding name punctuation is ignored.
    pub fn contains(&self, word: &str) -> bool {
        let key = word
            .trim_matches(|c: char| matches!(c, '.' | ',' | '\'' | '-'))
            .to_lowercase();
        !key.is_empty() && self.words.binary_search(&key).is_ok()
    }
}
