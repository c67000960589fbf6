//! Rule entity
//!
//! A rule covers a contiguous span of the source track and says how to
//! re-assemble it: the span is partitioned into labelled listings and the
//! pattern string plays them back in order.

use serde::{Deserialize, Deserializer, Serialize};

use crate::numeric::{lenient_f64, lenient_i64, lenient_string, lenient_u8, number_or_zero};
use crate::rules::listing::{parse_samples, SampleListing};

/// Display color of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Color {
    #[serde(deserialize_with = "lenient_u8")]
    pub r: u8,
    #[serde(deserialize_with = "lenient_u8")]
    pub g: u8,
    #[serde(deserialize_with = "lenient_u8")]
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self { r: 255, g: 0, b: 0 }
    }
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `"r,g,b"`. Missing or unparsable channels are 0.
    pub fn from_csv(text: &str) -> Self {
        let mut channels = text.split(',').map(|part| {
            let value = number_or_zero(&serde_json::Value::String(part.trim().to_string()));
            value.round().clamp(0.0, 255.0) as u8
        });
        Self {
            r: channels.next().unwrap_or(0),
            g: channels.next().unwrap_or(0),
            b: channels.next().unwrap_or(0),
        }
    }
}

fn default_one() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_label() -> String {
    "#0".to_string()
}

/// Accept either a listing array or mini-language text.
fn deserialize_samples<'de, D>(deserializer: D) -> std::result::Result<Vec<SampleListing>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(text) => Ok(parse_samples(&text)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| SampleListing::deserialize(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// One transformation step over a span of the source track.
///
/// Positions are sample counts. `end` is the last sample covered, so a
/// baked list satisfies `rules[i].end + 1 == rules[i + 1].start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(deserialize_with = "lenient_i64", default)]
    pub start: i64,

    #[serde(deserialize_with = "lenient_i64", default)]
    pub length: i64,

    #[serde(deserialize_with = "lenient_i64", default)]
    pub end: i64,

    #[serde(deserialize_with = "lenient_f64", default = "default_one")]
    pub volume: f64,

    /// Time-scale divisor applied to every excerpt
    #[serde(deserialize_with = "lenient_f64", default = "default_one")]
    pub factor: f64,

    #[serde(deserialize_with = "deserialize_samples", default)]
    pub samples: Vec<SampleListing>,

    #[serde(deserialize_with = "lenient_string", default)]
    pub pattern: String,

    /// When set, `label` is regenerated from the rule's index on bake
    #[serde(rename = "autoLabel", default = "default_true")]
    pub auto_label: bool,

    #[serde(deserialize_with = "lenient_string", default = "default_label")]
    pub label: String,

    #[serde(flatten)]
    pub color: Color,
}

impl Default for Rule {
    fn default() -> Self {
        Self::new(0, 0, 1.0, 1.0, Vec::new(), "")
    }
}

impl Rule {
    /// Create a rule covering `length` samples from `start`.
    pub fn new(
        start: i64,
        length: i64,
        volume: f64,
        factor: f64,
        samples: Vec<SampleListing>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            start,
            length,
            end: start.saturating_add(length).saturating_sub(1),
            volume,
            factor,
            samples,
            pattern: pattern.into(),
            auto_label: true,
            label: default_label(),
            color: Color::default(),
        }
    }

    /// Create a rule whose listings are given in mini-language text.
    pub fn with_sample_text(
        start: i64,
        length: i64,
        volume: f64,
        factor: f64,
        samples: &str,
        pattern: impl Into<String>,
    ) -> Self {
        Self::new(start, length, volume, factor, parse_samples(samples), pattern)
    }

    /// First sample after the rule.
    pub fn end_exclusive(&self) -> i64 {
        self.start.saturating_add(self.length)
    }

    /// Re-derive `end` from `start` and `length`.
    pub fn refresh_end(&mut self) {
        self.end = self.end_exclusive().saturating_sub(1);
    }

    /// True when `pos` lies within the rule's span.
    pub fn contains(&self, pos: i64) -> bool {
        pos >= self.start && pos < self.end_exclusive()
    }

    pub fn add_sample(&mut self, label: char, portion: f64) {
        self.samples.push(SampleListing::new(label, portion));
    }

    /// Index of the listing labelled `label`, ignoring case.
    pub fn sample_index_by_label(&self, label: char) -> Option<usize> {
        let wanted = label.to_uppercase().next()?;
        self.samples.iter().position(|s| s.label == wanted)
    }

    pub fn sample_by_label(&self, label: char) -> Option<&SampleListing> {
        self.sample_index_by_label(label).map(|i| &self.samples[i])
    }

    /// Sum of all listing portions.
    pub fn total_portion(&self) -> f64 {
        self.samples.iter().map(|s| s.portion).sum()
    }

    /// Length in seconds at `sample_rate`.
    pub fn length_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.length as f64 / f64::from(sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_derives_end() {
        let rule = Rule::with_sample_text(100, 50, 1.0, 2.0, "F,2;G,2", "FGgG");
        assert_eq!(rule.end, 149);
        assert_eq!(rule.end_exclusive(), 150);
        assert_eq!(rule.samples.len(), 2);
        assert!(rule.auto_label);
        assert_eq!(rule.label, "#0");
        assert_eq!(rule.color, Color::new(255, 0, 0));
    }

    #[test]
    fn test_sample_lookup_ignores_case() {
        let mut rule = Rule::with_sample_text(0, 10, 1.0, 1.0, "F,2;G,2", "FG");
        assert_eq!(rule.sample_index_by_label('g'), Some(1));
        assert_eq!(rule.sample_index_by_label('H'), None);
        assert_eq!(rule.sample_by_label('f').map(|s| s.portion), Some(0.5));

        rule.add_sample('h', 4.0);
        assert_eq!(rule.sample_index_by_label('H'), Some(2));
        assert_eq!(rule.total_portion(), 1.25);
    }

    #[test]
    fn test_contains() {
        let rule = Rule::new(10, 5, 1.0, 1.0, Vec::new(), "");
        assert!(rule.contains(10));
        assert!(rule.contains(14));
        assert!(!rule.contains(15));
        assert!(!rule.contains(9));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Rule::with_sample_text(0, 10, 1.0, 1.0, "F", "F");
        let mut copy = original.clone();
        copy.samples[0].portion = 0.25;
        assert_eq!(original.samples[0].portion, 1.0);
    }

    #[test]
    fn test_color_from_csv() {
        assert_eq!(Color::from_csv("10, 20,300"), Color::new(10, 20, 255));
        assert_eq!(Color::from_csv("7"), Color::new(7, 0, 0));
    }

    #[test]
    fn test_deserialize_lenient_fields() {
        let json = r#"{
            "start": "12",
            "length": 99.6,
            "volume": "loud",
            "factor": 2,
            "samples": "F,2;G,2",
            "pattern": "FG",
            "autoLabel": false,
            "label": "intro",
            "r": 0, "g": "128", "b": 512
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.start, 12);
        assert_eq!(rule.length, 100);
        assert_eq!(rule.volume, 0.0);
        assert_eq!(rule.factor, 2.0);
        assert_eq!(rule.samples, parse_samples("F,2;G,2"));
        assert!(!rule.auto_label);
        assert_eq!(rule.label, "intro");
        assert_eq!(rule.color, Color::new(0, 128, 255));
    }

    #[test]
    fn test_serialize_uses_file_field_names() {
        let rule = Rule::new(0, 10, 1.0, 1.0, Vec::new(), "F");
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["autoLabel"], serde_json::json!(true));
        assert_eq!(value["r"], serde_json::json!(255));
        assert_eq!(value["g"], serde_json::json!(0));
        assert!(value.get("color").is_none());
    }
}
