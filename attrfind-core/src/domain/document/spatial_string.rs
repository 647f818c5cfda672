// attrfind-core/src/domain/document/spatial_string.rs

use crate::domain::condition::AggregateFunction;
use crate::domain::error::DomainError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence reported for characters of a text-only string.
pub const NON_SPATIAL_CONFIDENCE: u8 = 100;

/// Text with optional per-character OCR confidence (0-100).
/// When `confidences` is `None` the string is non-spatial (text only).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "SpatialStringRepr", into = "SpatialStringRepr")]
pub struct SpatialString {
    text: String,
    confidences: Option<Vec<u8>>,
}

/// Wire shapes: a bare string for text-only values, or `{ "text", "confidences"? }`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SpatialStringRepr {
    Text(String),
    Spatial {
        text: String,
        #[serde(default)]
        confidences: Option<Vec<u8>>,
    },
}

impl From<SpatialString> for SpatialStringRepr {
    fn from(value: SpatialString) -> Self {
        match value.confidences {
            None => Self::Text(value.text),
            confidences => Self::Spatial {
                text: value.text,
                confidences,
            },
        }
    }
}

impl TryFrom<SpatialStringRepr> for SpatialString {
    type Error = DomainError;

    fn try_from(repr: SpatialStringRepr) -> Result<Self, Self::Error> {
        match repr {
            SpatialStringRepr::Text(text)
            | SpatialStringRepr::Spatial {
                text,
                confidences: None,
            } => Ok(Self::text_only(text)),
            SpatialStringRepr::Spatial {
                text,
                confidences: Some(confidences),
            } => Self::with_confidences(text, confidences),
        }
    }
}

impl SpatialString {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidences: None,
        }
    }

    /// Builds a spatial string. There must be exactly one confidence per character.
    pub fn with_confidences(
        text: impl Into<String>,
        confidences: Vec<u8>,
    ) -> Result<Self, DomainError> {
        let text = text.into();
        let char_count = text.chars().count();
        if char_count != confidences.len() {
            return Err(DomainError::InvalidDocument(format!(
                "{} characters but {} confidence values",
                char_count,
                confidences.len()
            )));
        }
        if let Some(bad) = confidences.iter().find(|c| **c > 100) {
            return Err(DomainError::InvalidDocument(format!(
                "confidence {} is outside 0-100",
                bad
            )));
        }
        Ok(Self {
            text,
            confidences: Some(confidences),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_spatial(&self) -> bool {
        self.confidences.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn confidences(&self) -> Option<&[u8]> {
        self.confidences.as_deref()
    }

    fn letter_confidences(&self) -> impl Iterator<Item = (char, u8)> + '_ {
        let confidences = self.confidences.as_deref();
        self.text.chars().enumerate().map(move |(i, c)| {
            let conf = confidences
                .and_then(|all| all.get(i).copied())
                .unwrap_or(NON_SPATIAL_CONFIDENCE);
            (c, conf)
        })
    }

    /// Aggregate confidence over the non-whitespace characters.
    /// A string without such characters reports 0.
    pub fn char_confidence(&self, function: AggregateFunction) -> i32 {
        let values: Vec<i32> = self
            .letter_confidences()
            .filter(|(c, _)| !c.is_whitespace())
            .map(|(_, conf)| i32::from(conf))
            .collect();

        if values.is_empty() {
            return 0;
        }

        match function {
            AggregateFunction::Minimum => values.iter().copied().min().unwrap_or(0),
            AggregateFunction::Maximum => values.iter().copied().max().unwrap_or(0),
            AggregateFunction::Average => {
                let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
                (sum / values.len() as i64) as i32
            }
        }
    }

    /// Slice by byte offsets (as reported by `regex`), keeping confidences.
    /// Offsets are clamped to the text and snapped to char boundaries.
    pub fn substring(&self, byte_start: usize, byte_end: usize) -> Self {
        let end = floor_char_boundary(&self.text, byte_end.min(self.text.len()));
        let start = floor_char_boundary(&self.text, byte_start.min(end));
        let text = self.text[start..end].to_string();

        let confidences = self.confidences.as_ref().map(|all| {
            let first = self.text[..start].chars().count();
            let count = text.chars().count();
            all.iter().skip(first).take(count).copied().collect()
        });

        Self { text, confidences }
    }

    /// Replaces every match of `regex`, expanding `$name` references.
    /// Inserted characters inherit the lowest confidence of the text they replace.
    pub fn replace_all(&self, regex: &Regex, replacement: &str) -> Self {
        let mut text = String::with_capacity(self.text.len());
        let mut confidences: Option<Vec<u8>> = self
            .confidences
            .as_ref()
            .map(|c| Vec::with_capacity(c.len()));
        let mut last = 0;

        for caps in regex.captures_iter(&self.text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };

            let kept = self.substring(last, whole.start());
            text.push_str(kept.as_str());

            let mut inserted = String::new();
            caps.expand(replacement, &mut inserted);
            text.push_str(&inserted);

            if let Some(out) = confidences.as_mut() {
                out.extend(kept.confidences.unwrap_or_default());
                let replaced = self.substring(whole.start(), whole.end());
                let fill = replaced
                    .confidences
                    .as_ref()
                    .and_then(|c| c.iter().min().copied())
                    .unwrap_or(NON_SPATIAL_CONFIDENCE);
                out.extend(std::iter::repeat_n(fill, inserted.chars().count()));
            }

            last = whole.end();
        }

        let tail = self.substring(last, self.text.len());
        text.push_str(tail.as_str());
        if let Some(out) = confidences.as_mut() {
            out.extend(tail.confidences.unwrap_or_default());
        }

        Self { text, confidences }
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl fmt::Display for SpatialString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for SpatialString {
    fn from(text: &str) -> Self {
        Self::text_only(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_accepts_both_shapes() -> anyhow::Result<()> {
        let plain: SpatialString = serde_json::from_str(r#""Acme""#)?;
        assert!(!plain.is_spatial());

        let spatial: SpatialString = serde_json::from_str(r#"{"text":"ab","confidences":[90,40]}"#)?;
        assert_eq!(spatial.char_confidence(AggregateFunction::Minimum), 40);

        let mismatched = serde_json::from_str::<SpatialString>(r#"{"text":"ab","confidences":[90]}"#);
        assert!(mismatched.is_err());
        Ok(())
    }

    #[test]
    fn test_serialize_text_only_as_bare_string() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&SpatialString::text_only("Acme"))?, r#""Acme""#);

        let spatial = SpatialString::with_confidences("ab", vec![90, 40])?;
        let json = serde_json::to_string(&spatial)?;
        assert_eq!(json, r#"{"text":"ab","confidences":[90,40]}"#);
        assert_eq!(serde_json::from_str::<SpatialString>(&json)?, spatial);
        Ok(())
    }

    #[test]
    fn test_aggregates_skip_whitespace() -> anyhow::Result<()> {
        let s = SpatialString::with_confidences("ab c", vec![80, 90, 0, 70])?;
        assert_eq!(s.char_confidence(AggregateFunction::Minimum), 70);
        assert_eq!(s.char_confidence(AggregateFunction::Maximum), 90);
        assert_eq!(s.char_confidence(AggregateFunction::Average), 80);
        Ok(())
    }

    #[test]
    fn test_non_spatial_and_blank_strings() {
        let text = SpatialString::text_only("hello");
        assert_eq!(text.char_confidence(AggregateFunction::Average), 100);
        let blank = SpatialString::text_only("   ");
        assert_eq!(blank.char_confidence(AggregateFunction::Maximum), 0);
    }

    #[test]
    fn test_confidence_count_must_match() {
        let res = SpatialString::with_confidences("abc", vec![1, 2]);
        assert!(matches!(res, Err(DomainError::InvalidDocument(_))));
    }

    #[test]
    fn test_substring_keeps_confidences() -> anyhow::Result<()> {
        let s = SpatialString::with_confidences("Smith, John", (0..11).collect())?;
        let sub = s.substring(7, 11);
        assert_eq!(sub.as_str(), "John");
        assert_eq!(sub.confidences(), Some(&[7, 8, 9, 10][..]));
        Ok(())
    }

    #[test]
    fn test_replace_all_fills_with_min_confidence() -> anyhow::Result<()> {
        let s = SpatialString::with_confidences("a--b", vec![90, 40, 60, 95])?;
        let re = Regex::new("-+").unwrap();
        let out = s.replace_all(&re, " ");
        assert_eq!(out.as_str(), "a b");
        assert_eq!(out.confidences(), Some(&[90, 40, 95][..]));
        Ok(())
    }
}
