//! Lint result types.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use coplint_plugin::{CorrectionStatus, Offense, Severity};

use crate::corrector::{CorrectionOutcome, CorrectionReport};
use crate::directive::DirectiveWarning;
use crate::dispatch::RuleCrash;
use crate::resolver::ConfigWarning;

/// Result of linting a single file.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    /// Path to the linted file.
    pub path: PathBuf,

    /// Offenses remaining in the final buffer, in reporting order.
    pub offenses: Vec<Offense>,

    /// Offenses fixed by autocorrection.
    pub corrected: Vec<Offense>,

    /// The rewritten source, present only when it differs from the input.
    pub corrected_source: Option<String>,

    /// How the correction loop went, when autocorrection ran.
    pub correction: Option<CorrectionReport>,

    /// Rules that failed on this file.
    pub crashes: Vec<RuleCrash>,

    /// Problems with inline directives.
    pub warnings: Vec<DirectiveWarning>,

    /// Time spent per rule, when timings were requested.
    pub timings: HashMap<String, Duration>,
}

impl FileReport {
    /// Creates an empty report.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the source was rewritten.
    pub fn is_changed(&self) -> bool {
        self.corrected_source.is_some()
    }

    /// Returns true if any remaining offense is at or above `level`.
    pub fn fails_at(&self, level: Severity) -> bool {
        self.offenses.iter().any(|o| o.severity >= level)
    }

    /// Why autocorrection left this file unfinished, if it did.
    pub fn correction_warning(&self) -> Option<String> {
        let correction = self.correction.as_ref()?;
        match &correction.outcome {
            CorrectionOutcome::MaxPassesReached => Some(format!(
                "stopped autocorrecting after {} passes without reaching a fixed point",
                correction.rewrites
            )),
            CorrectionOutcome::Failed { error } => Some(format!("could not apply corrections: {error}")),
            _ => None,
        }
    }

    /// Offenses a run with autocorrection could still fix.
    pub fn correctable_count(&self) -> usize {
        self.offenses
            .iter()
            .filter(|o| {
                matches!(
                    o.correction,
                    CorrectionStatus::Correctable | CorrectionStatus::Withheld
                )
            })
            .count()
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub files_inspected: usize,

    /// Remaining offenses.
    pub offenses: usize,

    pub by_severity: BTreeMap<Severity, usize>,

    pub correctable: usize,

    pub corrected: usize,
}

impl Summary {
    /// Creates a summary from reports.
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut summary = Self::default();

        for report in reports {
            summary.files_inspected += 1;
            summary.offenses += report.offenses.len();
            for offense in &report.offenses {
                *summary.by_severity.entry(offense.severity).or_default() += 1;
            }
            summary.correctable += report.correctable_count();
            summary.corrected += report.corrected.len();
        }

        summary
    }

    /// Number of remaining offenses with exactly this severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

/// Which bucket a run falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// No offense at or above the fail level.
    Clean,
    OffensesFound,
    /// The run stopped before inspecting files.
    ConfigurationError,
    /// The abort flag was raised before every file was inspected.
    Interrupted,
}

impl RunStatus {
    /// Buckets a finished run.
    pub fn from_reports(reports: &[FileReport], fail_level: Severity) -> Self {
        if reports.iter().any(|r| r.fails_at(fail_level)) {
            RunStatus::OffensesFound
        } else {
            RunStatus::Clean
        }
    }

    /// Conventional process exit code.
    pub const fn exit_code(self) -> i32 {
        match self {
            RunStatus::Clean => 0,
            RunStatus::OffensesFound => 1,
            RunStatus::ConfigurationError => 2,
            RunStatus::Interrupted => 130,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, RunStatus::Clean)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct LintRun {
    /// One report per inspected file, ordered by path.
    pub reports: Vec<FileReport>,
    pub summary: Summary,
    pub status: RunStatus,
    pub config_warnings: Vec<ConfigWarning>,
}
