//! Rules the engine itself provides.
//!
//! `Lint/Syntax` stands for parse failures and cannot be disabled. The two
//! redundant-directive rules report `disable` targets that suppressed
//! nothing and `enable` targets that re-enabled nothing; they are computed
//! by the engine after filtering, not by walking the tree.

use std::collections::BTreeSet;

use coplint_ast::{Location, SourceBuffer, SourceDocument, Span};
use coplint_parser::ParseError;
use coplint_plugin::{
    Edit, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta, Severity,
};

use crate::directive::{DirectiveKind, DirectiveSet, Target, TargetRef};
use crate::dispatch::RawOffense;
use crate::registry::RuleRegistry;
use crate::resolver::EffectiveConfig;

pub const SYNTAX_RULE: &str = "Lint/Syntax";
pub const REDUNDANT_DISABLE_RULE: &str = "Lint/RedundantDisableDirective";
pub const REDUNDANT_ENABLE_RULE: &str = "Lint/RedundantEnableDirective";

const SYNTAX: RuleMeta = RuleMeta::new(SYNTAX_RULE, "Reports source that cannot be parsed.")
    .severity(Severity::Fatal)
    .immutable();

const REDUNDANT_DISABLE: RuleMeta = RuleMeta::new(
    REDUNDANT_DISABLE_RULE,
    "Checks for disable directives that suppress nothing.",
)
.severity(Severity::Warning)
.autocorrect();

const REDUNDANT_ENABLE: RuleMeta = RuleMeta::new(
    REDUNDANT_ENABLE_RULE,
    "Checks for enable directives that re-enable nothing.",
)
.severity(Severity::Warning)
.autocorrect();

/// Registered by [`RuleRegistry::new`], in this order.
pub const DESCRIPTORS: [RuleDescriptor; 3] = [
    RuleDescriptor::new(SYNTAX, || Box::new(Syntax)),
    RuleDescriptor::new(REDUNDANT_DISABLE, || Box::new(RedundantDirective)),
    RuleDescriptor::new(REDUNDANT_ENABLE, || Box::new(RedundantDirective)),
];

struct Syntax;

impl Rule for Syntax {}

/// The offense reported for a file that does not parse.
pub fn syntax_offense(error: &ParseError, buffer: Option<&SourceBuffer>) -> Offense {
    let position = error.position();
    let span = buffer
        .and_then(|b| b.offset(position))
        .map_or(Span::empty(0), Span::empty);
    Offense::new(
        SYNTAX_RULE,
        error.message(),
        span,
        Location::new(position, position),
    )
    .with_severity(Severity::Fatal)
}

struct RedundantDirective;

impl Rule for RedundantDirective {
    fn correct(&self, offense: &Offense, cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        Ok(removal(cx.document(), offense.span).map(Edit::delete))
    }
}

/// The span to delete to drop a whole directive comment or one of its
/// targets.
fn removal(document: &SourceDocument, span: Span) -> Option<Span> {
    let buffer = document.buffer();
    let text = buffer.text();
    let comment = document.comments().iter().find(|c| c.span.covers(&span))?;

    if span == comment.span {
        let line = buffer.line(comment.line(buffer))?;
        if comment.is_trailing(buffer) {
            let before = &text[line.start as usize..comment.span.start as usize];
            let start = line.start + before.trim_end().len() as u32;
            return Some(Span::new(start, comment.span.end));
        }
        return Some(line.full_span());
    }

    let after = &text[span.end as usize..comment.span.end as usize];
    if let Some(rest) = after.trim_start().strip_prefix(',') {
        let skip = after.len() - rest.trim_start().len();
        return Some(Span::new(span.start, span.end + skip as u32));
    }
    let before = &text[comment.span.start as usize..span.start as usize];
    match before.trim_end().strip_suffix(',') {
        Some(head) => Some(Span::new(comment.span.start + head.len() as u32, span.end)),
        None => Some(span),
    }
}

/// Offenses for directive targets that had no effect.
///
/// `hits` are the targets credited by the offense filter. `seq` continues
/// the emission order of the pass. A disable target covering a rule in
/// `crashed` is never reported: that rule stopped before it could emit the
/// offenses the directive is there for.
pub(crate) fn redundant_directive_offenses(
    document: &SourceDocument,
    directives: &DirectiveSet,
    hits: &BTreeSet<TargetRef>,
    crashed: &BTreeSet<&str>,
    registry: &RuleRegistry,
    config: &EffectiveConfig,
    mut seq: usize,
) -> Vec<RawOffense> {
    let mut out = Vec::new();
    let buffer = document.buffer();
    let mut push = |rule: &'static str, span: Span, message: String| {
        let Some(slot) = registry.index_of(rule) else {
            return;
        };
        let severity = registry
            .descriptor(slot)
            .map_or(Severity::Warning, |d| d.meta.default_severity);
        let offense = Offense::new(rule, message, span, buffer.location(span)).with_severity(severity);
        out.push(RawOffense { offense, slot, seq });
        seq += 1;
    };

    let disable_enabled = config.is_enabled(REDUNDANT_DISABLE_RULE);
    let enable_enabled = config.is_enabled(REDUNDANT_ENABLE_RULE);
    let redundant_enables: BTreeSet<TargetRef> = directives.redundant_enables().iter().copied().collect();

    for (id, directive) in directives.directives().iter().enumerate() {
        let (rule, verb, unused): (&'static str, &str, Vec<usize>) = match directive.kind {
            DirectiveKind::Disable if disable_enabled => (
                REDUNDANT_DISABLE_RULE,
                "disabling",
                (0..directive.targets.len())
                    .filter(|t| !hits.contains(&(id, *t)))
                    .filter(|&t| !covers_crashed(&directive.targets[t].target, crashed))
                    .collect(),
            ),
            DirectiveKind::Enable if enable_enabled => (
                REDUNDANT_ENABLE_RULE,
                "enabling",
                (0..directive.targets.len())
                    .filter(|t| redundant_enables.contains(&(id, *t)))
                    .collect(),
            ),
            _ => continue,
        };
        let unused: Vec<usize> = unused
            .into_iter()
            .filter(|&t| !names_meta_rule(&directive.targets[t].target))
            .collect();
        if unused.is_empty() {
            continue;
        }

        if unused.len() == directive.targets.len() {
            let message = match directive.targets.as_slice() {
                [only] if only.target == Target::All => format!("Unnecessary {verb} of all rules."),
                targets => {
                    let names: Vec<String> = targets.iter().map(describe).collect();
                    format!("Unnecessary {verb} of {}.", names.join(", "))
                }
            };
            push(rule, directive.comment, message);
        } else {
            for t in unused {
                let target = &directive.targets[t];
                push(rule, target.span, format!("Unnecessary {verb} of {}.", describe(target)));
            }
        }
    }
    out
}

fn describe(target: &crate::directive::DirectiveTarget) -> String {
    match target.target {
        Target::Inert => format!("`{}` (unknown rule)", target.name),
        _ => format!("`{}`", target.name),
    }
}

fn covers_crashed(target: &Target, crashed: &BTreeSet<&str>) -> bool {
    match target {
        Target::All => !crashed.is_empty(),
        Target::Rules(names) => names.iter().any(|name| crashed.contains(name)),
        Target::Inert => false,
    }
}

/// A target naming one of the redundant-directive rules is never reported,
/// or the report could never be silenced.
fn names_meta_rule(target: &Target) -> bool {
    matches!(target, Target::Rules(names)
        if names.as_slice() == [REDUNDANT_DISABLE_RULE]
            || names.as_slice() == [REDUNDANT_ENABLE_RULE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::filter_offenses;
    use crate::resolver::ConfigResolver;
    use coplint_ast::Position;
    use coplint_parser::{Parser, ScriptParser};
    use coplint_plugin::RuleConfig;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    struct Noop;
    impl Rule for Noop {}

    fn registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        for name in ["Style/A", "Style/B"] {
            registry
                .register(RuleDescriptor::new(RuleMeta::new(name, ""), || Box::new(Noop)))
                .unwrap();
        }
        registry
    }

    /// Messages of the redundant-directive offenses when `offending` lines
    /// carry a `Style/A` offense.
    fn redundant(src: &str, offending: &[u32]) -> Vec<(String, String)> {
        redundant_with_crashes(src, offending, &[])
    }

    fn redundant_with_crashes(src: &str, offending: &[u32], crashed: &[&str]) -> Vec<(String, String)> {
        let registry = registry();
        let doc = ScriptParser::new().parse(src).unwrap();
        let directives = DirectiveSet::parse(&doc, &registry);
        let config = ConfigResolver::new(&registry)
            .resolve(&[], Path::new("a.cop"))
            .unwrap();
        let raw = offending
            .iter()
            .map(|&line| {
                let start = doc.buffer().line(line).unwrap().start;
                let span = Span::new(start, start + 1);
                RawOffense {
                    offense: Offense::new("Style/A", "a", span, doc.buffer().location(span)),
                    slot: 0,
                    seq: 0,
                }
            })
            .collect();
        let filtered = filter_offenses(raw, &directives, &config);
        let crashed: BTreeSet<&str> = crashed.iter().copied().collect();
        redundant_directive_offenses(&doc, &directives, &filtered.hits, &crashed, &registry, &config, 0)
            .into_iter()
            .map(|r| (doc.buffer().slice(r.offense.span).to_string(), r.offense.message))
            .collect()
    }

    #[test]
    fn used_disable_is_not_reported() {
        assert_eq!(redundant("x = 1 # coplint:disable Style/A\n", &[1]), vec![]);
    }

    #[test]
    fn unused_disable_reports_whole_comment() {
        assert_eq!(
            redundant("x = 1 # coplint:disable Style/A\n", &[]),
            vec![(
                "# coplint:disable Style/A".to_string(),
                "Unnecessary disabling of `Style/A`.".to_string()
            )]
        );
        assert_eq!(
            redundant("# coplint:disable all\nx = 1\n", &[]),
            vec![(
                "# coplint:disable all".to_string(),
                "Unnecessary disabling of all rules.".to_string()
            )]
        );
    }

    #[test]
    fn partly_used_disable_reports_each_unused_name() {
        assert_eq!(
            redundant("x = 1 # coplint:disable Style/A, Style/B, Nope\n", &[1]),
            vec![
                ("Style/B".to_string(), "Unnecessary disabling of `Style/B`.".to_string()),
                ("Nope".to_string(), "Unnecessary disabling of `Nope` (unknown rule).".to_string()),
            ]
        );
    }

    #[test]
    fn unused_enable_is_reported() {
        assert_eq!(
            redundant("x = 1\n# coplint:enable Style/A\n", &[]),
            vec![(
                "# coplint:enable Style/A".to_string(),
                "Unnecessary enabling of `Style/A`.".to_string()
            )]
        );
    }

    #[test]
    fn targets_of_crashed_rules_are_not_reported() {
        let src = "x = 1 # coplint:disable Style/A, Style/B\ny = 2 # coplint:disable all\n";
        assert_eq!(
            redundant_with_crashes(src, &[], &["Style/A"]),
            vec![("Style/B".to_string(), "Unnecessary disabling of `Style/B`.".to_string())]
        );
    }

    #[test]
    fn directives_naming_the_meta_rules_are_exempt() {
        assert_eq!(
            redundant("x = 1 # coplint:disable Lint/RedundantDisableDirective\n", &[]),
            vec![]
        );
    }

    fn corrected(src: &str, span: Span) -> String {
        let doc = ScriptParser::new().parse(src).unwrap();
        let config = RuleConfig::enabled();
        let cx = RuleContext::new(&REDUNDANT_DISABLE, &config, &doc);
        let offense = cx.offense(span, "x");
        let edit = RedundantDirective.correct(&offense, &cx).unwrap().unwrap();
        let mut out = src.to_string();
        out.replace_range(edit.span.range(), &edit.replacement);
        out
    }

    #[test]
    fn corrections_remove_comments_and_names() {
        let src = "x = 1   # coplint:disable Style/A\n";
        assert_eq!(corrected(src, Span::new(8, 33)), "x = 1\n");

        let src = "# coplint:disable Style/A\nx = 1\n";
        assert_eq!(corrected(src, Span::new(0, 25)), "x = 1\n");

        let src = "x = 1 # coplint:disable Style/A, Style/B\n";
        assert_eq!(corrected(src, Span::new(24, 31)), "x = 1 # coplint:disable Style/B\n");
        assert_eq!(corrected(src, Span::new(33, 40)), "x = 1 # coplint:disable Style/A\n");
    }

    #[test]
    fn syntax_offense_is_positioned() {
        let buffer = SourceBuffer::new("x = (\n");
        let err = ParseError::syntax("unexpected end of input", Position::new(1, 6));
        let offense = syntax_offense(&err, Some(&buffer));
        assert_eq!(offense.rule, SYNTAX_RULE);
        assert_eq!(offense.severity, Severity::Fatal);
        assert_eq!(offense.span, Span::empty(6));
        assert_eq!(offense.line(), 1);
    }
}
