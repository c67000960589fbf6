//! Sample listings and the sample mini-language
//!
//! A listing names a fraction of a rule's duration with a single letter.
//! Listings are stored uppercase; the case used in a pattern decides the
//! playback direction.
//!
//! The mini-language is a list of `label,denominator` pairs separated by
//! `;`, `|`, `/`, `█` or newlines. A denominator above 1 means
//! `1/denominator`, and a pair without a comma reads the rest of the text
//! after the label as the denominator (`F2` is `F,2`, `F` is a whole rule).

use log::error;
use serde::{Deserialize, Serialize};

use crate::numeric::{number_or_zero, parse_float_prefix, truncate};

/// Label used when a listing is given a character without case.
pub const DEFAULT_LABEL: char = 'F';

/// Playback direction selected by a pattern character's case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Play the excerpt as recorded
    Forward,
    /// Play the excerpt backwards
    Reverse,
}

impl Direction {
    /// Direction for a pattern character: lowercase reverses, anything
    /// else plays forward. `invert` swaps the two.
    pub fn from_char(c: char, invert: bool) -> Self {
        let reversed = c.is_lowercase() != invert;
        if reversed {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Normalise a label to uppercase, replacing case-less characters.
fn normalize_label(label: char) -> char {
    if label.is_lowercase() || label.is_uppercase() {
        label.to_uppercase().next().unwrap_or(DEFAULT_LABEL)
    } else {
        error!(
            "\"{}\" is an invalid sample label (no letter case); defaulting to \"{}\"",
            label, DEFAULT_LABEL
        );
        DEFAULT_LABEL
    }
}

/// Normalise a portion: non-finite becomes 1, values above 1 are
/// denominators.
fn normalize_portion(portion: f64) -> f64 {
    if !portion.is_finite() {
        1.0
    } else if portion > 1.0 {
        1.0 / portion
    } else {
        portion
    }
}

/// A labelled fraction of a rule's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSampleListing")]
pub struct SampleListing {
    /// Uppercase label
    pub label: char,
    /// Fraction of the rule's length
    pub portion: f64,
}

impl SampleListing {
    /// Create a listing, normalising the label and portion.
    pub fn new(label: char, portion: f64) -> Self {
        Self {
            label: normalize_label(label),
            portion: normalize_portion(portion),
        }
    }

    /// Parse one `label,denominator` pair.
    pub fn parse(text: &str) -> Self {
        let (label_part, portion_part) = match text.split_once(',') {
            Some((label, portion)) => (label, portion),
            None => {
                let split = text.chars().next().map_or(0, char::len_utf8);
                text.split_at(split)
            }
        };
        let label = label_part.trim().chars().next().unwrap_or('\0');
        let portion = parse_float_prefix(portion_part).unwrap_or(f64::NAN);
        Self::new(label, portion)
    }

    /// Denominator form of the portion, as written in the mini-language.
    pub fn denominator(&self) -> f64 {
        if self.portion > 0.0 {
            truncate(1.0 / self.portion, 1000.0)
        } else {
            0.0
        }
    }
}

/// Wire form accepted when reading listings from rule files.
#[derive(Deserialize)]
struct RawSampleListing {
    #[serde(default)]
    label: serde_json::Value,
    #[serde(default)]
    portion: serde_json::Value,
}

impl From<RawSampleListing> for SampleListing {
    fn from(raw: RawSampleListing) -> Self {
        let label = match &raw.label {
            serde_json::Value::String(s) => s.chars().next().unwrap_or('\0'),
            _ => '\0',
        };
        let portion = if raw.portion.is_null() {
            f64::NAN
        } else {
            number_or_zero(&raw.portion)
        };
        SampleListing::new(label, portion)
    }
}

/// Parse mini-language text into listings. Empty pairs are skipped.
pub fn parse_samples(text: &str) -> Vec<SampleListing> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '\r' | '\t'))
        .map(|c| match c {
            '█' | '|' | ';' | '/' | '\n' => ':',
            other => other,
        })
        .collect();

    cleaned
        .split(':')
        .filter(|pair| !pair.is_empty())
        .map(SampleListing::parse)
        .collect()
}

/// Render listings back into mini-language text (`F,2;G,2`).
pub fn format_samples(samples: &[SampleListing]) -> String {
    samples
        .iter()
        .map(|s| format!("{},{}", s.label, s.denominator()))
        .collect::<Vec<_>>()
        .join(";")
}
