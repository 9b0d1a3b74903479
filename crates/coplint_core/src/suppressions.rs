//! Generates a configuration that suppresses every current offense.
//!
//! Each rule with offenses gets an `Exclude` list of the files it fired
//! in, or is disabled outright once that list would grow past the limit.
//! The rendered text is JSONC and can be loaded back as a config file.

use std::collections::{BTreeMap, BTreeSet};

use coplint_plugin::Offense;
use serde_json::{Map, Value, json};

use crate::builtin::SYNTAX_RULE;
use crate::config::ConfigLayer;

/// Files listed per rule before the rule is disabled instead.
pub const DEFAULT_MAX_EXCLUSIONS: usize = 15;

const HEADING: &str = "\
// This configuration was generated by `coplint --auto-gen-config`.
// The point is for the user to remove these configuration records
// one by one as the offenses are removed from the code base.
";

/// The suppression for one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionEntry {
    pub rule: String,
    pub offenses: usize,
    /// Files the rule fired in, sorted.
    pub files: BTreeSet<String>,
    /// The rule fired in too many files to list them.
    pub disabled: bool,
}

/// Accumulates offenses file by file.
#[derive(Debug, Clone)]
pub struct SuppressionGenerator {
    max_exclusions: usize,
    rules: BTreeMap<String, (usize, BTreeSet<String>)>,
}

impl Default for SuppressionGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXCLUSIONS)
    }
}

impl SuppressionGenerator {
    pub fn new(max_exclusions: usize) -> Self {
        Self {
            max_exclusions,
            rules: BTreeMap::new(),
        }
    }

    /// Records the offenses of one file under its display path.
    ///
    /// Syntax errors cannot be suppressed and are skipped.
    pub fn add_file(&mut self, path: &str, offenses: &[Offense]) {
        for offense in offenses.iter().filter(|o| o.rule != SYNTAX_RULE) {
            let (count, files) = self.rules.entry(offense.rule.clone()).or_default();
            *count += 1;
            files.insert(path.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// One entry per rule, most offenses first, then by name.
    pub fn entries(&self) -> Vec<SuppressionEntry> {
        let mut entries: Vec<SuppressionEntry> = self
            .rules
            .iter()
            .map(|(rule, (offenses, files))| SuppressionEntry {
                rule: rule.clone(),
                offenses: *offenses,
                files: files.clone(),
                disabled: files.len() > self.max_exclusions,
            })
            .collect();
        // The map already orders by name; the sort is stable.
        entries.sort_by(|a, b| b.offenses.cmp(&a.offenses));
        entries
    }

    /// The suppressions as a configuration layer.
    pub fn to_layer(&self) -> ConfigLayer {
        let values: Map<String, Value> = self
            .entries()
            .into_iter()
            .map(|entry| {
                let section = if entry.disabled {
                    json!({ "Enabled": false })
                } else {
                    json!({ "Exclude": entry.files })
                };
                (entry.rule, section)
            })
            .collect();
        ConfigLayer::new("auto-gen-config", values)
    }

    /// Renders the suppressions as a JSONC document.
    pub fn render(&self) -> String {
        let entries = self.entries();
        let mut out = String::from(HEADING);
        out.push('{');
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(&format!(
                "\n  // Offense count: {}\n  {}: {{\n",
                entry.offenses,
                quote(&entry.rule)
            ));
            if entry.disabled {
                out.push_str("    \"Enabled\": false\n");
            } else {
                let files: Vec<String> = entry
                    .files
                    .iter()
                    .map(|file| format!("      {}", quote(file)))
                    .collect();
                out.push_str("    \"Exclude\": [\n");
                out.push_str(&files.join(",\n"));
                out.push_str("\n    ]\n");
            }
            out.push_str("  }");
        }
        if !entries.is_empty() {
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn quote(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplint_ast::{Location, Position, Span};
    use pretty_assertions::assert_eq;

    fn offenses(rules: &[&str]) -> Vec<Offense> {
        let at = Position::new(1, 0);
        rules
            .iter()
            .map(|rule| Offense::new(*rule, "msg", Span::new(0, 1), Location::new(at, at)))
            .collect()
    }

    fn generator() -> SuppressionGenerator {
        let mut generator = SuppressionGenerator::new(2);
        generator.add_file("a.cop", &offenses(&["Style/A", "Style/A", "Lint/B"]));
        generator.add_file("b.cop", &offenses(&["Style/A", SYNTAX_RULE]));
        generator.add_file("c.cop", &offenses(&["Style/A", "Lint/B"]));
        generator.add_file("d\"q.cop", &offenses(&["Layout/C"]));
        generator
    }

    #[test]
    fn renders_byte_exact_jsonc() {
        let expected = r#"// This configuration was generated by `coplint --auto-gen-config`.
// The point is for the user to remove these configuration records
// one by one as the offenses are removed from the code base.
{
  // Offense count: 4
  "Style/A": {
    "Enabled": false
  },
  // Offense count: 2
  "Lint/B": {
    "Exclude": [
      "a.cop",
      "c.cop"
    ]
  },
  // Offense count: 1
  "Layout/C": {
    "Exclude": [
      "d\"q.cop"
    ]
  }
}
"#;
        assert_eq!(generator().render(), expected);
    }

    #[test]
    fn ties_are_ordered_by_rule_name() {
        let mut generator = SuppressionGenerator::default();
        generator.add_file("x.cop", &offenses(&["Style/Z", "Lint/M", "Layout/A"]));
        let names: Vec<_> = generator.entries().into_iter().map(|e| e.rule).collect();
        assert_eq!(names, vec!["Layout/A", "Lint/M", "Style/Z"]);
    }

    #[test]
    fn rendered_text_loads_back_as_the_same_layer() {
        let generator = generator();
        let loaded = ConfigLayer::from_jsonc("generated", &generator.render()).unwrap();
        assert_eq!(loaded.values, generator.to_layer().values);
    }

    #[test]
    fn empty_generator_renders_an_empty_object() {
        let generator = SuppressionGenerator::default();
        assert!(generator.is_empty());
        assert!(generator.render().ends_with("code base.\n{}\n"));
    }
}
