//! Single file linting logic.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use coplint_ast::SourceBuffer;
use coplint_parser::{Parser, decode_utf8};
use coplint_plugin::CorrectionStatus;
use tracing::{debug, warn};

use crate::builtin::{redundant_directive_offenses, syntax_offense};
use crate::corrector::{CorrectionOutcome, Corrector, PassResult};
use crate::directive::{DirectiveSet, DirectiveWarning};
use crate::dispatch::{Dispatcher, RuleCrash};
use crate::filter::{filter_directive_offenses, filter_offenses, sort_offenses};
use crate::fixer::Proposal;
use crate::linter::LintOptions;
use crate::registry::RuleRegistry;
use crate::resolver::EffectiveConfig;
use crate::result::FileReport;

/// Side products of one analysis.
#[derive(Debug, Default)]
struct Analysis {
    crashes: Vec<RuleCrash>,
    warnings: Vec<DirectiveWarning>,
    timings: Vec<(&'static str, Duration)>,
}

/// Runs the whole pipeline for one file: parse, dispatch, filter and,
/// when asked, the correction loop.
#[derive(Clone, Copy)]
pub struct FileLinter<'a> {
    registry: &'a RuleRegistry,
    parser: &'a dyn Parser,
    options: &'a LintOptions,
}

impl<'a> FileLinter<'a> {
    pub fn new(registry: &'a RuleRegistry, parser: &'a dyn Parser, options: &'a LintOptions) -> Self {
        Self {
            registry,
            parser,
            options,
        }
    }

    /// Lints the raw contents of `path`.
    pub fn lint(&self, path: &Path, bytes: &[u8], config: &EffectiveConfig) -> FileReport {
        debug!("Linting {}", path.display());
        let mut report = FileReport::new(path);

        let text = match decode_utf8(bytes) {
            Ok(text) => text,
            Err(error) => {
                debug!("{}: {}", path.display(), error);
                report.offenses.push(syntax_offense(&error, None));
                return report;
            }
        };

        if !self.options.autocorrect {
            let mut analysis = Analysis::default();
            let pass = self.analyze(path, text, config, false, &mut analysis);
            report.offenses = pass.offenses;
            absorb(&mut report, vec![analysis], 0);
            return report;
        }

        let max_passes = self
            .options
            .max_correction_passes
            .unwrap_or(config.max_correction_passes);
        let mut analyses = Vec::new();
        let run = Corrector::new(max_passes).run(text.to_string(), |buffer| {
            let mut analysis = Analysis::default();
            let pass = self.analyze(path, buffer, config, true, &mut analysis);
            analyses.push(analysis);
            pass
        });

        // A discarded rewrite was analyzed last; report the one before it.
        let last_kept = match run.report.outcome {
            CorrectionOutcome::Reverted => analyses.len().saturating_sub(2),
            _ => analyses.len().saturating_sub(1),
        };
        absorb(&mut report, analyses, last_kept);

        if run.changed() {
            debug!(
                "Corrected {} offenses in {} ({} passes)",
                run.report.corrected,
                path.display(),
                run.report.rewrites
            );
            report.corrected_source = Some(run.source);
        }
        report.offenses = run.offenses;
        report.corrected = run.corrected;
        report.correction = Some(run.report);
        if let Some(message) = report.correction_warning() {
            warn!("{}: {}", path.display(), message);
        }
        report
    }

    /// Parses `text` and runs every enabled rule over it.
    ///
    /// With `correcting` set, correctable rules are asked for their edits;
    /// otherwise their offenses are only marked correctable.
    fn analyze(
        &self,
        path: &Path,
        text: &str,
        config: &EffectiveConfig,
        correcting: bool,
        analysis: &mut Analysis,
    ) -> PassResult {
        let document = match self.parser.parse(text) {
            Ok(document) => document.with_path(path),
            Err(error) => {
                debug!("{}: {}", path.display(), error);
                let buffer = SourceBuffer::new(text);
                return PassResult {
                    offenses: vec![syntax_offense(&error, Some(&buffer))],
                    proposals: Vec::new(),
                    syntax_error: true,
                };
            }
        };

        let directives = DirectiveSet::parse(&document, self.registry);
        analysis.warnings = directives.warnings().to_vec();

        let mut dispatch = Dispatcher::new(self.registry)
            .with_timings(self.options.timings)
            .run(&document, config);
        let raw = std::mem::take(&mut dispatch.offenses);
        let next_seq = raw.iter().map(|r| r.seq + 1).max().unwrap_or(0);

        let filtered = filter_offenses(raw, &directives, config);
        let mut kept = filtered.kept;
        let crashed: BTreeSet<&str> = dispatch.crashes.iter().map(|c| c.rule.as_str()).collect();
        let meta = redundant_directive_offenses(
            &document,
            &directives,
            &filtered.hits,
            &crashed,
            self.registry,
            config,
            next_seq,
        );
        if !meta.is_empty() {
            kept.extend(filter_directive_offenses(meta, &directives, config));
            sort_offenses(&mut kept);
        }

        // Edits are requested in registration order, then emission order,
        // which is the order conflicts are settled in.
        let mut order: Vec<usize> = (0..kept.len()).collect();
        order.sort_by_key(|&i| (kept[i].slot, kept[i].seq));

        let buffer = document.buffer();
        let mut proposals = Vec::new();
        let mut crashes = Vec::new();
        for index in order {
            let Some(active) = dispatch.rule_mut(kept[index].slot) else {
                continue;
            };
            if !active.can_correct() || active.is_crashed() {
                continue;
            }
            if !correcting {
                kept[index].offense.correction = CorrectionStatus::Correctable;
                continue;
            }
            match active.correct(&kept[index].offense, &document) {
                Ok(Some(edit)) => {
                    let span = edit.span;
                    if span.start > span.end
                        || !buffer.is_char_boundary(span.start)
                        || !buffer.is_char_boundary(span.end)
                    {
                        warn!(
                            "Ignoring {} edit at [{}, {}): not a valid range of the source",
                            active.name(),
                            span.start,
                            span.end
                        );
                        continue;
                    }
                    kept[index].offense.correction = CorrectionStatus::Correctable;
                    proposals.push(Proposal {
                        offense: index,
                        rule: kept[index].offense.rule.clone(),
                        edit,
                    });
                }
                Ok(None) => {}
                Err(crash) => crashes.push(crash),
            }
        }

        analysis.timings = dispatch.timings().collect();
        analysis.crashes = std::mem::take(&mut dispatch.crashes);
        analysis.crashes.extend(crashes);

        PassResult {
            offenses: kept.into_iter().map(|r| r.offense).collect(),
            proposals,
            syntax_error: false,
        }
    }
}

/// Folds the side products of every analysis into `report`.
///
/// Crashes are reported once per rule and phase, directive warnings come
/// from the analysis at `last_kept`, and timings are summed.
fn absorb(report: &mut FileReport, analyses: Vec<Analysis>, last_kept: usize) {
    let mut timings: HashMap<String, Duration> = HashMap::new();
    for (index, analysis) in analyses.into_iter().enumerate() {
        for crash in analysis.crashes {
            let seen = report
                .crashes
                .iter()
                .any(|c| c.rule == crash.rule && c.phase == crash.phase);
            if !seen {
                report.crashes.push(crash);
            }
        }
        if index == last_kept {
            report.warnings = analysis.warnings;
        }
        for (rule, elapsed) in analysis.timings {
            *timings.entry(rule.to_string()).or_default() += elapsed;
        }
    }
    report.timings = timings;
}
