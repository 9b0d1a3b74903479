//! The autocorrection loop.
//!
//! Each pass analyzes the current buffer, plans the offered edits, and
//! applies them into a new buffer, which the next pass analyzes again.
//! Buffer contents are hashed with blake3 so that a rewrite reproducing an
//! earlier buffer is caught as a cycle instead of ping-ponging until the
//! pass limit.

use blake3::Hash;
use coplint_plugin::{CorrectionStatus, Offense};
use tracing::{debug, warn};

use crate::CorrectionError;
use crate::fixer::{self, Decision, EditPlan, Proposal};
use crate::resolver::DEFAULT_MAX_CORRECTION_PASSES;

/// What one analysis of a buffer produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResult {
    /// Final, ordered offenses for the buffer.
    pub offenses: Vec<Offense>,
    /// Offered edits in planning order. `Proposal::offense` indexes
    /// `offenses`.
    pub proposals: Vec<Proposal>,
    /// The buffer did not parse.
    pub syntax_error: bool,
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// No pass offered any more edits.
    Converged,
    /// A pass offered exactly the edits of the pass before it.
    Stalled,
    /// Applying the planned edits would reproduce an earlier buffer.
    CycleDetected { cycle_length: usize },
    MaxPassesReached,
    /// A rewrite no longer parsed and was discarded.
    Reverted,
    /// The planned edits could not be applied.
    Failed { error: CorrectionError },
}

impl CorrectionOutcome {
    /// Returns true when the loop reached a fixed point.
    pub fn is_converged(&self) -> bool {
        matches!(self, CorrectionOutcome::Converged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionReport {
    pub outcome: CorrectionOutcome,
    /// Buffers written, i.e. passes whose edits were kept.
    pub rewrites: usize,
    /// Times the analysis ran, including the initial one.
    pub analyses: usize,
    /// Offenses fixed across all kept rewrites.
    pub corrected: usize,
    /// Edits withheld because they conflicted with an earlier edit.
    pub withheld: usize,
}

/// Result of [`Corrector::run`].
#[derive(Debug, Clone)]
pub struct CorrectionRun {
    /// The last good buffer.
    pub source: String,
    /// Offenses of the last kept analysis.
    pub offenses: Vec<Offense>,
    /// Offenses fixed on the way, stamped [`CorrectionStatus::Corrected`].
    pub corrected: Vec<Offense>,
    pub report: CorrectionReport,
}

impl CorrectionRun {
    /// Returns true if the final buffer differs from the input.
    pub fn changed(&self) -> bool {
        self.report.rewrites > 0
    }
}

/// Drives analysis passes until a fixed point or a stop condition.
#[derive(Debug, Clone, Copy)]
pub struct Corrector {
    max_passes: usize,
}

impl Default for Corrector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CORRECTION_PASSES)
    }
}

impl Corrector {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    /// Corrects `source`, calling `analyze` once per buffer.
    pub fn run<F>(&self, source: String, mut analyze: F) -> CorrectionRun
    where
        F: FnMut(&str) -> PassResult,
    {
        let mut current = source;
        let mut pass = analyze(&current);
        let mut history: Vec<Hash> = vec![hash_content(&current)];
        let mut previous_edits: Option<Hash> = None;
        let mut corrected = Vec::new();
        let mut report = CorrectionReport {
            outcome: CorrectionOutcome::Converged,
            rewrites: 0,
            analyses: 1,
            corrected: 0,
            withheld: 0,
        };

        report.outcome = loop {
            if pass.syntax_error || pass.proposals.is_empty() {
                break CorrectionOutcome::Converged;
            }

            let edits_hash = hash_proposals(&pass.proposals);
            if previous_edits == Some(edits_hash) {
                debug!("Correction stalled: pass {} offered the same edits again", report.analyses);
                break CorrectionOutcome::Stalled;
            }
            if report.rewrites >= self.max_passes {
                debug!("Pass limit of {} reached", self.max_passes);
                break CorrectionOutcome::MaxPassesReached;
            }

            let plan = fixer::plan_edits(&pass.proposals);
            let rewritten = match fixer::apply_edits(&current, &plan.edits) {
                Ok(text) => text,
                Err(error) => {
                    debug!("Could not apply corrections: {error}");
                    break CorrectionOutcome::Failed { error };
                }
            };

            let digest = hash_content(&rewritten);
            if let Some(index) = history.iter().position(|h| *h == digest) {
                let cycle_length = history.len() - index;
                debug!("Correction cycle of length {cycle_length} detected");
                break CorrectionOutcome::CycleDetected { cycle_length };
            }

            let next = analyze(&rewritten);
            report.analyses += 1;
            if next.syntax_error {
                warn!("Discarding corrections that made the source unparsable");
                break CorrectionOutcome::Reverted;
            }

            report.rewrites += 1;
            report.withheld += plan.withheld();
            for index in plan.corrected() {
                let offense = &pass.offenses[pass.proposals[index].offense];
                corrected.push(offense.clone().with_correction(CorrectionStatus::Corrected));
                report.corrected += 1;
            }

            history.push(digest);
            previous_edits = Some(edits_hash);
            current = rewritten;
            pass = next;
        };

        let mut offenses = pass.offenses;
        if !pass.proposals.is_empty() {
            mark_withheld(&mut offenses, &pass.proposals, &fixer::plan_edits(&pass.proposals));
        }

        CorrectionRun {
            source: current,
            offenses,
            corrected,
            report,
        }
    }
}

/// Stamps the offenses whose edit lost a conflict in `plan`.
pub fn mark_withheld(offenses: &mut [Offense], proposals: &[Proposal], plan: &EditPlan) {
    for (proposal, decision) in proposals.iter().zip(&plan.decisions) {
        if *decision == Decision::Withheld
            && let Some(offense) = offenses.get_mut(proposal.offense)
        {
            offense.correction = CorrectionStatus::Withheld;
        }
    }
}

fn hash_content(content: &str) -> Hash {
    blake3::hash(content.as_bytes())
}

/// Hashes the set of (rule, range, replacement) triples offered in a pass.
fn hash_proposals(proposals: &[Proposal]) -> Hash {
    let mut triples: Vec<(&str, u32, u32, &str)> = proposals
        .iter()
        .map(|p| {
            (
                p.rule.as_str(),
                p.edit.span.start,
                p.edit.span.end,
                p.edit.replacement.as_str(),
            )
        })
        .collect();
    triples.sort_unstable();
    triples.dedup();

    let mut hasher = blake3::Hasher::new();
    for (rule, start, end, replacement) in triples {
        hasher.update(&(rule.len() as u64).to_le_bytes());
        hasher.update(rule.as_bytes());
        hasher.update(&start.to_le_bytes());
        hasher.update(&end.to_le_bytes());
        hasher.update(&(replacement.len() as u64).to_le_bytes());
        hasher.update(replacement.as_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplint_ast::{Location, Position, Span};
    use coplint_plugin::Edit;
    use pretty_assertions::assert_eq;

    fn offense(rule: &str, span: Span) -> Offense {
        let location = Location::new(Position::new(1, span.start), Position::new(1, span.end));
        Offense::new(rule, "fix me", span, location).with_correction(CorrectionStatus::Correctable)
    }

    /// Offers a whole-buffer replacement when `text` equals `from`.
    fn single(rule: &str, text: &str, replacement: &str) -> PassResult {
        let span = Span::new(0, text.len() as u32);
        PassResult {
            offenses: vec![offense(rule, span)],
            proposals: vec![Proposal {
                offense: 0,
                rule: rule.to_string(),
                edit: Edit::new(span, replacement),
            }],
            syntax_error: false,
        }
    }

    #[test]
    fn chained_corrections_converge() {
        let run = Corrector::default().run("a".to_string(), |text| match text {
            "a" => single("Test/A", text, "b"),
            "b" => single("Test/B", text, "c"),
            "c" => single("Test/C", text, "d"),
            _ => PassResult::default(),
        });

        assert_eq!(run.source, "d");
        assert_eq!(run.report.outcome, CorrectionOutcome::Converged);
        assert_eq!(run.report.rewrites, 3);
        assert_eq!(run.report.analyses, 4);
        assert_eq!(run.report.corrected, 3);
        let rules: Vec<_> = run.corrected.iter().map(|o| o.rule.as_str()).collect();
        assert_eq!(rules, vec!["Test/A", "Test/B", "Test/C"]);
        assert!(run.offenses.is_empty());
        assert!(run.changed());
    }

    #[test]
    fn toggling_quotes_is_a_cycle() {
        let run = Corrector::default().run("\"x\"".to_string(), |text| match text {
            "\"x\"" => single("Style/Single", text, "'x'"),
            _ => single("Style/Double", text, "\"x\""),
        });

        assert_eq!(run.report.outcome, CorrectionOutcome::CycleDetected { cycle_length: 2 });
        assert_eq!(run.source, "'x'");
        assert_eq!(run.report.rewrites, 1);
        assert_eq!(run.offenses[0].rule, "Style/Double");
        assert_eq!(run.offenses[0].correction, CorrectionStatus::Correctable);
    }

    #[test]
    fn repeated_edits_stall() {
        // Keeps offering the same insertion, growing the buffer each time.
        let run = Corrector::default().run("x".to_string(), |_| PassResult {
            offenses: vec![offense("Test/Grow", Span::empty(0))],
            proposals: vec![Proposal {
                offense: 0,
                rule: "Test/Grow".to_string(),
                edit: Edit::insert(0, "-"),
            }],
            syntax_error: false,
        });

        assert_eq!(run.report.outcome, CorrectionOutcome::Stalled);
        assert_eq!(run.source, "-x");
        assert_eq!(run.report.rewrites, 1);
    }

    #[test]
    fn pass_limit_keeps_best_effort_buffer() {
        let mut n = 0;
        let run = Corrector::new(2).run("0".to_string(), |text| {
            n += 1;
            single(&format!("Test/R{n}"), text, &n.to_string())
        });

        assert_eq!(run.report.outcome, CorrectionOutcome::MaxPassesReached);
        assert_eq!(run.report.rewrites, 2);
        assert_eq!(run.source, "2");
    }

    #[test]
    fn unparsable_rewrite_is_reverted() {
        let run = Corrector::default().run("ok".to_string(), |text| match text {
            "ok" => single("Test/Break", text, "("),
            _ => PassResult {
                syntax_error: true,
                ..PassResult::default()
            },
        });

        assert_eq!(run.report.outcome, CorrectionOutcome::Reverted);
        assert_eq!(run.source, "ok");
        assert_eq!(run.report.rewrites, 0);
        assert_eq!(run.report.analyses, 2);
        assert_eq!(run.offenses[0].rule, "Test/Break");
        assert!(run.corrected.is_empty());
    }

    #[test]
    fn conflicting_edit_is_withheld_then_retried() {
        let run = Corrector::default().run("0123456789".to_string(), |text| {
            let mut pass = PassResult::default();
            if text.starts_with("01234") {
                pass.offenses.push(offense("Test/First", Span::new(0, 5)));
                pass.proposals.push(Proposal {
                    offense: 0,
                    rule: "Test/First".into(),
                    edit: Edit::new(Span::new(0, 5), "A"),
                });
            }
            if let Some(at) = text.find("34567") {
                let span = Span::new(at as u32, at as u32 + 5);
                pass.proposals.push(Proposal {
                    offense: pass.offenses.len(),
                    rule: "Test/Second".into(),
                    edit: Edit::new(span, "B"),
                });
                pass.offenses.push(offense("Test/Second", span));
            }
            pass
        });

        // The second edit loses the first pass and no longer applies after it.
        assert_eq!(run.source, "A56789");
        assert_eq!(run.report.withheld, 1);
        assert_eq!(run.report.corrected, 1);
    }

    #[test]
    fn withheld_offenses_are_marked_when_the_loop_stops() {
        let proposals = vec![
            Proposal {
                offense: 0,
                rule: "Test/A".into(),
                edit: Edit::new(Span::new(0, 5), "a"),
            },
            Proposal {
                offense: 1,
                rule: "Test/B".into(),
                edit: Edit::new(Span::new(3, 8), "b"),
            },
        ];
        let mut offenses = vec![
            offense("Test/A", Span::new(0, 5)),
            offense("Test/B", Span::new(3, 8)),
        ];
        mark_withheld(&mut offenses, &proposals, &fixer::plan_edits(&proposals));
        assert_eq!(offenses[0].correction, CorrectionStatus::Correctable);
        assert_eq!(offenses[1].correction, CorrectionStatus::Withheld);
    }

    #[test]
    fn proposal_hash_ignores_order() {
        let a = Proposal {
            offense: 0,
            rule: "A/B".into(),
            edit: Edit::insert(1, "x"),
        };
        let b = Proposal {
            offense: 1,
            rule: "A/C".into(),
            edit: Edit::insert(4, "y"),
        };
        assert_eq!(
            hash_proposals(&[a.clone(), b.clone()]),
            hash_proposals(&[b, a])
        );
    }
}
