//! Declarative parsing of line-oriented engine output.
//!
//! Each engine describes what it prints as a static list of [`FieldRule`]s.
//! When a vendor changes its output format only the table changes.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// First line containing the marker.
    Contains(&'static str),
    /// Zero-based line index.
    Line(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    AfterMarker,
    AfterFirstColon,
    WholeLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub locator: Locator,
    pub extractor: Extractor,
}

impl FieldRule {
    pub const fn new(field: &'static str, locator: Locator, extractor: Extractor) -> Self {
        Self {
            field,
            locator,
            extractor,
        }
    }

    fn extract(&self, line: &str) -> Option<String> {
        let value = match (self.extractor, self.locator) {
            (Extractor::AfterMarker, Locator::Contains(marker)) => {
                let start = line.find(marker)? + marker.len();
                &line[start..]
            }
            (Extractor::AfterMarker, Locator::Line(_)) | (Extractor::WholeLine, _) => line,
            (Extractor::AfterFirstColon, _) => line.split_once(':')?.1,
        };
        Some(value.trim().to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OutputGrammar {
    pub rules: &'static [FieldRule],
}

impl OutputGrammar {
    pub const fn new(rules: &'static [FieldRule]) -> Self {
        Self { rules }
    }

    pub fn parse(&self, text: &str) -> ParsedOutput {
        let lines: Vec<&str> = text.lines().collect();
        let mut fields = HashMap::new();

        for rule in self.rules {
            let value = match rule.locator {
                Locator::Line(index) => lines.get(index).and_then(|line| rule.extract(line)),
                Locator::Contains(marker) => lines
                    .iter()
                    .find(|line| line.contains(marker))
                    .and_then(|line| rule.extract(line)),
            };

            if let Some(value) = value {
                fields.entry(rule.field).or_insert(value);
            }
        }

        ParsedOutput { fields }
    }

    /// True when some line equals `marker` once surrounding whitespace is dropped.
    pub fn matches_line(text: &str, marker: &str) -> bool {
        let marker = marker.trim();
        text.lines().any(|line| line.trim() == marker)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    fields: HashMap<&'static str, String>,
}

impl ParsedOutput {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Removes the field, leaving an empty string when it was never found.
    pub fn take(&mut self, field: &str) -> String {
        self.fields.remove(field).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RULES: &[FieldRule] = &[
        FieldRule::new("version", Locator::Contains("Version:"), Extractor::AfterMarker),
        FieldRule::new("date", Locator::Contains("Database date"), Extractor::AfterFirstColon),
        FieldRule::new("second", Locator::Line(1), Extractor::AfterFirstColon),
    ];
    const GRAMMAR: OutputGrammar = OutputGrammar::new(RULES);

    #[test]
    fn test_after_marker_trims() {
        let parsed = GRAMMAR.parse("Name: engine\nVersion:   4.2.1  \n");
        assert_eq!(parsed.get("version"), Some("4.2.1"));
    }

    #[test]
    fn test_after_marker_mid_line() {
        let parsed = GRAMMAR.parse("Product Version: 8.0.4.312\n");
        assert_eq!(parsed.get("version"), Some("8.0.4.312"));
    }

    #[test]
    fn test_first_match_wins() {
        let parsed = GRAMMAR.parse("Version: 1\nVersion: 2\n");
        assert_eq!(parsed.get("version"), Some("1"));
    }

    #[test]
    fn test_after_first_colon_keeps_later_colons() {
        let parsed = GRAMMAR.parse("Database date: 2019-03-14 10:21:00\n");
        assert_eq!(parsed.get("date"), Some("2019-03-14 10:21:00"));
    }

    #[test]
    fn test_line_locator() {
        let parsed = GRAMMAR.parse("Viruses found: 1\nVirus name:   Trojan:Win32/Test\n");
        assert_eq!(parsed.get("second"), Some("Trojan:Win32/Test"));
    }

    #[test]
    fn test_missing_fields_stay_unset() {
        let mut parsed = GRAMMAR.parse("only one line without colon");
        assert!(!parsed.contains("version"));
        assert!(!parsed.contains("second"));
        assert_eq!(parsed.take("date"), "");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_line_without_colon_is_unset() {
        let parsed = GRAMMAR.parse("header\nno colon here\n");
        assert_eq!(parsed.get("second"), None);
    }

    #[test]
    fn test_matches_line_is_exact() {
        let out = "Objects scanned:     1\nThreats found:       1\nRiskware found:      0\n";
        assert!(OutputGrammar::matches_line(out, "Threats found:       1"));
        assert!(!OutputGrammar::matches_line(
            "Threats found:       10\n",
            "Threats found:       1"
        ));
        assert!(!OutputGrammar::matches_line(
            "Threats found:       0\n",
            "Threats found:       1"
        ));
    }

    #[test]
    fn test_matches_line_tolerates_crlf() {
        assert!(OutputGrammar::matches_line(
            "Threats found:       1\r\n",
            "Threats found:       1"
        ));
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(text in "\\PC*") {
            let parsed = GRAMMAR.parse(&text);
            prop_assert!(parsed.len() <= RULES.len());
        }

        #[test]
        fn prop_parse_never_panics_on_marker_soup(
            lines in proptest::collection::vec("(Version:|Database date|:| |x|\u{00e9}){0,8}", 0..6)
        ) {
            let text = lines.join("\n");
            let parsed = GRAMMAR.parse(&text);
            if let Some(v) = parsed.get("version") {
                prop_assert_eq!(v, v.trim());
            }
        }
    }
}
