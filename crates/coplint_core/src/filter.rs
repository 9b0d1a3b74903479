//! Decides which raw offenses survive into the report.
//!
//! Offenses on lines where a directive disables their rule are dropped, and
//! the directive target is credited with the hit. Offenses of rules the
//! configuration disables are dropped. Survivors get their configured
//! severity and are sorted by line, column and rule name.

use std::collections::BTreeSet;

use crate::directive::{DirectiveSet, TargetRef};
use crate::dispatch::RawOffense;
use crate::resolver::EffectiveConfig;

/// Output of [`filter_offenses`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filtered {
    pub kept: Vec<RawOffense>,
    /// Directive targets that suppressed at least one offense.
    pub hits: BTreeSet<TargetRef>,
}

/// Filters, stamps and sorts `raw`.
///
/// Running the filter on its own output changes nothing.
pub fn filter_offenses(raw: Vec<RawOffense>, directives: &DirectiveSet, config: &EffectiveConfig) -> Filtered {
    let mut hits = BTreeSet::new();
    let mut kept: Vec<RawOffense> = raw
        .into_iter()
        .filter_map(|raw| {
            let suppressed_by = directives.disabled_by(raw.offense.line(), &raw.offense.rule);
            if !suppressed_by.is_empty() {
                hits.extend(suppressed_by);
                return None;
            }
            configure(raw, config)
        })
        .collect();
    sort_offenses(&mut kept);
    Filtered { kept, hits }
}

/// Filters the engine's redundant-directive offenses.
///
/// Only a directive naming the meta rule itself silences them. Nothing is
/// credited and the result is left unsorted.
pub fn filter_directive_offenses(
    raw: Vec<RawOffense>,
    directives: &DirectiveSet,
    config: &EffectiveConfig,
) -> Vec<RawOffense> {
    raw.into_iter()
        .filter(|raw| {
            !directives
                .disabled_on(raw.offense.line())
                .rules
                .iter()
                .any(|rule| *rule == raw.offense.rule)
        })
        .filter_map(|raw| configure(raw, config))
        .collect()
}

/// Drops offenses of disabled rules and stamps the configured severity.
fn configure(mut raw: RawOffense, config: &EffectiveConfig) -> Option<RawOffense> {
    let rule_config = config.get(&raw.offense.rule).filter(|c| c.enabled)?;
    if let Some(severity) = rule_config.severity {
        raw.offense.severity = severity;
    }
    Some(raw)
}

/// Sorts by line, column, then rule name; ties keep emission order.
pub fn sort_offenses(offenses: &mut [RawOffense]) {
    offenses.sort_by(|a, b| a.offense.sort_key().cmp(&b.offense.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleRegistry;
    use crate::resolver::ConfigResolver;
    use crate::config::ConfigLayer;
    use coplint_ast::Span;
    use coplint_parser::{Parser, ScriptParser};
    use coplint_plugin::{Offense, Rule, RuleDescriptor, RuleMeta, Severity};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;

    struct Noop;
    impl Rule for Noop {}

    const SRC: &str = "x = 1\ny = 2 # coplint:disable Style/A\nz = 3\n";

    fn setup(layers: &[ConfigLayer]) -> (DirectiveSet, EffectiveConfig, coplint_ast::SourceDocument) {
        let mut registry = RuleRegistry::empty();
        for name in ["Style/A", "Lint/B", "Layout/C"] {
            registry
                .register(RuleDescriptor::new(RuleMeta::new(name, ""), || Box::new(Noop)))
                .unwrap();
        }
        let doc = ScriptParser::new().parse(SRC).unwrap();
        let directives = DirectiveSet::parse(&doc, &registry);
        let config = ConfigResolver::new(&registry)
            .resolve(layers, Path::new("a.cop"))
            .unwrap();
        (directives, config, doc)
    }

    fn raw(doc: &coplint_ast::SourceDocument, rule: &str, start: u32, seq: usize) -> RawOffense {
        let span = Span::new(start, start + 1);
        RawOffense {
            offense: Offense::new(rule, "msg", span, doc.buffer().location(span)),
            slot: 0,
            seq,
        }
    }

    #[test]
    fn drops_directive_suppressed_offenses_and_records_hits() {
        let (directives, config, doc) = setup(&[]);
        let filtered = filter_offenses(
            vec![raw(&doc, "Style/A", 6, 0), raw(&doc, "Style/A", 0, 1), raw(&doc, "Lint/B", 6, 2)],
            &directives,
            &config,
        );
        let kept: Vec<_> = filtered.kept.iter().map(|r| r.seq).collect();
        assert_eq!(kept, vec![1, 2]);
        assert_eq!(filtered.hits, BTreeSet::from([(0, 0)]));
    }

    #[test]
    fn applies_config_and_severity_then_sorts() {
        let layers = [ConfigLayer::from_value(
            "cfg",
            json!({ "Layout/C": { "Enabled": false }, "Lint/B": { "Severity": "error" } }),
        )
        .unwrap()];
        let (directives, config, doc) = setup(&layers);
        let filtered = filter_offenses(
            vec![
                raw(&doc, "Lint/B", 38, 0),
                raw(&doc, "Layout/C", 0, 1),
                raw(&doc, "Style/A", 38, 2),
                raw(&doc, "Lint/B", 2, 3),
            ],
            &directives,
            &config,
        );
        let kept: Vec<_> = filtered
            .kept
            .iter()
            .map(|r| (r.offense.line(), r.offense.rule.as_str(), r.offense.severity))
            .collect();
        assert_eq!(
            kept,
            vec![
                (1, "Lint/B", Severity::Error),
                (3, "Lint/B", Severity::Error),
                (3, "Style/A", Severity::Convention),
            ]
        );
    }

    #[test]
    fn filtering_is_idempotent() {
        let (directives, config, doc) = setup(&[]);
        let input = vec![
            raw(&doc, "Style/A", 38, 0),
            raw(&doc, "Style/A", 6, 1),
            raw(&doc, "Lint/B", 0, 2),
        ];
        let once = filter_offenses(input, &directives, &config);
        let twice = filter_offenses(once.kept.clone(), &directives, &config);
        assert_eq!(once.kept, twice.kept);
    }

    #[test]
    fn directive_offenses_are_silenced_only_by_name() {
        let (directives, config, doc) = setup(&[]);
        let kept = filter_directive_offenses(
            vec![raw(&doc, "Style/A", 6, 0), raw(&doc, "Lint/B", 6, 1)],
            &directives,
            &config,
        );
        let rules: Vec<_> = kept.iter().map(|r| r.offense.rule.as_str()).collect();
        assert_eq!(rules, vec!["Lint/B"]);
    }
}
