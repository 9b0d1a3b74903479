//! Planning and applying the edits of one correction pass.

use std::collections::BTreeMap;

use coplint_plugin::Edit;
use tracing::debug;

use crate::CorrectionError;

/// An edit a rule offered for one offense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Index of the offense in the pass's offense list.
    pub offense: usize,
    pub rule: String,
    pub edit: Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    /// Identical to an accepted edit; the offense counts as corrected.
    Duplicate,
    /// Conflicts with an accepted edit.
    Withheld,
}

/// The outcome of planning: accepted edits plus one decision per proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPlan {
    pub edits: Vec<Edit>,
    pub decisions: Vec<Decision>,
}

impl EditPlan {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Proposals whose offense will be fixed by this plan.
    pub fn corrected(&self) -> impl Iterator<Item = usize> + '_ {
        self.decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != Decision::Withheld)
            .map(|(i, _)| i)
    }

    pub fn withheld(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| **d == Decision::Withheld)
            .count()
    }
}

/// Accepts proposals in order, withholding any that conflicts with an
/// edit already accepted.
///
/// `proposals` must already be in planning order (rule registration order,
/// then emission order), so the result is deterministic.
pub fn plan_edits(proposals: &[Proposal]) -> EditPlan {
    // Accepted spans never conflict, so ordered by start their ends never
    // decrease either.
    let mut accepted: BTreeMap<(u32, u32), usize> = BTreeMap::new();
    let mut plan = EditPlan::default();

    for proposal in proposals {
        let span = proposal.edit.span;
        let conflict = accepted
            .range(..=(span.end, u32::MAX))
            .rev()
            .take_while(|((_, end), _)| *end >= span.start)
            .map(|(_, &i)| &plan.edits[i])
            .find(|edit| edit.span.conflicts_with(&span))
            .map(|edit| *edit == proposal.edit);

        let decision = match conflict {
            None => {
                accepted.insert((span.start, span.end), plan.edits.len());
                plan.edits.push(proposal.edit.clone());
                Decision::Accepted
            }
            Some(true) => Decision::Duplicate,
            Some(false) => {
                debug!(
                    "Withholding {} edit at [{}, {}): conflicts with an earlier edit",
                    proposal.rule, span.start, span.end
                );
                Decision::Withheld
            }
        };
        plan.decisions.push(decision);
    }
    plan
}

/// Applies non-conflicting edits in one left-to-right pass.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<String, CorrectionError> {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));

    let len = text.len() as u32;
    for edit in &sorted {
        let span = edit.span;
        if span.start > span.end || span.end > len {
            return Err(CorrectionError::OutOfBounds { span, len });
        }
        for offset in [span.start, span.end] {
            if !text.is_char_boundary(offset as usize) {
                return Err(CorrectionError::NotCharBoundary { offset });
            }
        }
    }
    for pair in sorted.windows(2) {
        if pair[0].span.conflicts_with(&pair[1].span) {
            return Err(CorrectionError::Overlap {
                first: pair[0].span,
                second: pair[1].span,
            });
        }
    }

    let growth: usize = sorted.iter().map(|e| e.replacement.len()).sum();
    let mut out = String::with_capacity(text.len() + growth);
    let mut cursor = 0;
    for edit in sorted {
        out.push_str(&text[cursor..edit.span.start as usize]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end as usize;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}
