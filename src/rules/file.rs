//! Rule files
//!
//! A rule file is a pretty-printed JSON array of rules. Reading re-derives
//! `end` and normalises every listing, so hand-edited or older files load
//! into a consistent state.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::error::{Result, SkipjackError};
use crate::rules::rule::Rule;

/// Extension rule files are expected to carry.
pub const RULE_FILE_EXTENSION: &str = "json";

/// Parse rules from JSON text.
pub fn parse_rules(content: &str) -> Result<Vec<Rule>> {
    let mut rules: Vec<Rule> = serde_json::from_str(content)?;
    for rule in &mut rules {
        rule.refresh_end();
    }
    Ok(rules)
}

/// Load rules from `path`.
pub fn load_rules(path: &Path) -> Result<Vec<Rule>> {
    if !path.exists() {
        return Err(SkipjackError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_extension(path);

    let content = fs::read_to_string(path).map_err(|e| SkipjackError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let rules = parse_rules(&content)?;
    info!("Loaded {} rules from {}", rules.len(), path.display());
    Ok(rules)
}

/// Save rules to `path` as pretty-printed JSON.
pub fn save_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    check_extension(path);
    let content = serde_json::to_string_pretty(rules)?;
    fs::write(path, content).map_err(|e| SkipjackError::FileWriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!("Saved {} rules to {}", rules.len(), path.display());
    Ok(())
}

fn check_extension(path: &Path) {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(RULE_FILE_EXTENSION));
    if !matches {
        warn!(
            "{} does not have a .{} extension; treating it as a rule file anyway",
            path.display(),
            RULE_FILE_EXTENSION
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::MAX_SAFE_INTEGER;
    use crate::state::bake_positions;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_rules() -> Vec<Rule> {
        let mut second = Rule::with_sample_text(100, 50, 0.5, 2.0, "F,2;G,2", "FGgG");
        second.auto_label = false;
        second.label = "chorus".to_string();
        vec![
            Rule::with_sample_text(0, 100, 1.0, 1.0, "F", "F"),
            second,
        ]
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let rules = sample_rules();

        save_rules(&path, &rules).unwrap();
        assert_eq!(load_rules(&path).unwrap(), rules);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_rules(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SkipjackError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_clamps_out_of_range_positions() {
        let rules = parse_rules(r#"[{ "start": -1e300, "length": 0 }]"#).unwrap();
        assert_eq!(rules[0].start, -MAX_SAFE_INTEGER);
        assert_eq!(rules[0].end, -MAX_SAFE_INTEGER - 1);

        let mut rules = parse_rules(r#"[{ "length": 1e300 }, { "length": 5 }]"#).unwrap();
        assert_eq!(rules[0].length, MAX_SAFE_INTEGER);
        bake_positions(&mut rules);
        assert_eq!(rules[1].start, MAX_SAFE_INTEGER);
        assert_eq!(rules[1].end, MAX_SAFE_INTEGER + 4);
    }

    #[test]
    fn test_bake_saturates_instead_of_overflowing() {
        let mut rules = vec![
            Rule::with_sample_text(0, i64::MAX, 1.0, 1.0, "F", "F"),
            Rule::with_sample_text(0, 5, 1.0, 1.0, "F", "F"),
        ];
        bake_positions(&mut rules);
        assert_eq!(rules[1].start, i64::MAX);
        assert_eq!(rules[1].end, i64::MAX - 1);
    }

    #[test]
    fn test_parse_recomputes_end() {
        let rules = parse_rules(r#"[{ "start": 10, "length": 20, "end": 999 }]"#).unwrap();
        assert_eq!(rules[0].end, 29);
        assert_eq!(rules[0].factor, 1.0);
        assert_eq!(rules[0].label, "#0");
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_rules("not json"),
            Err(SkipjackError::Serialization(_))
        ));
    }
}
