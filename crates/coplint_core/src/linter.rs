//! Core linter engine.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use coplint_parser::Parser;
use coplint_plugin::Severity;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{ConfigLayer, ConfigSource};
use crate::file_linter::FileLinter;
use crate::registry::RuleRegistry;
use crate::resolver::{ConfigResolver, EffectiveConfig, PreparedConfig};
use crate::result::{FileReport, LintRun, RunStatus, Summary};
use crate::LinterError;

/// Run-wide settings that do not come from configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintOptions {
    /// Rewrite sources with the offered corrections.
    pub autocorrect: bool,
    /// Lowest severity that makes the run fail.
    pub fail_level: Severity,
    /// Record time spent per rule.
    pub timings: bool,
    /// Overrides `AllCops.MaxCorrectionPasses`.
    pub max_correction_passes: Option<usize>,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self {
            autocorrect: false,
            fail_level: Severity::Refactor,
            timings: false,
            max_correction_passes: None,
        }
    }
}

/// The contents of one file to lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl SourceInput {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// The core linter engine.
///
/// Holds the registry and parser shared by every file. File I/O stays with
/// the caller: inputs arrive as bytes and corrected sources leave in the
/// reports.
pub struct Linter {
    registry: Arc<RuleRegistry>,
    parser: Arc<dyn Parser>,
    options: LintOptions,
    abort: Arc<AtomicBool>,
}

impl Linter {
    /// Creates a new linter.
    pub fn new(registry: Arc<RuleRegistry>, parser: Arc<dyn Parser>, options: LintOptions) -> Self {
        Self {
            registry,
            parser,
            options,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    /// Flag that stops the run before the next file when set.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    fn file_linter(&self) -> FileLinter<'_> {
        FileLinter::new(&self.registry, self.parser.as_ref(), &self.options)
    }

    /// Resolves the configuration for a single path.
    pub fn resolve_config(&self, path: &Path, source: &dyn ConfigSource) -> Result<EffectiveConfig, LinterError> {
        let layers = source.layers_for(path)?;
        Ok(ConfigResolver::new(&self.registry).resolve(&layers, path)?)
    }

    /// Lints one file with an already resolved configuration.
    pub fn lint_source(&self, path: &Path, contents: &[u8], config: &EffectiveConfig) -> FileReport {
        self.file_linter().lint(path, contents, config)
    }

    /// Lints many files in parallel.
    ///
    /// Every configuration is resolved before the first file is inspected,
    /// so a configuration error fails the run without partial results.
    /// Files excluded by configuration are skipped.
    pub fn lint_sources(&self, inputs: Vec<SourceInput>, source: &dyn ConfigSource) -> Result<LintRun, LinterError> {
        let resolver = ConfigResolver::new(&self.registry);
        let mut prepared: HashMap<blake3::Hash, PreparedConfig> = HashMap::new();
        let mut config_warnings = Vec::new();
        let mut jobs = Vec::with_capacity(inputs.len());

        for input in inputs {
            let layers = source.layers_for(&input.path)?;
            let config = match prepared.entry(layers_key(&layers)) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let config = resolver.prepare(&layers)?;
                    for warning in config.warnings() {
                        if !config_warnings.contains(warning) {
                            config_warnings.push(warning.clone());
                        }
                    }
                    entry.insert(config)
                }
            };
            let effective = config.effective_for(&self.registry, &input.path);
            if effective.excluded {
                debug!("Skipping excluded file {}", input.path.display());
                continue;
            }
            jobs.push((input, effective));
        }
        info!("Inspecting {} files", jobs.len());

        let linter = self.file_linter();
        let abort = &self.abort;
        let results: Vec<Option<FileReport>> = jobs
            .par_iter()
            .map(|(input, config)| {
                if abort.load(Ordering::Relaxed) {
                    return None;
                }
                Some(linter.lint(&input.path, &input.contents, config))
            })
            .collect();

        let interrupted = results.iter().any(Option::is_none);
        let mut reports: Vec<FileReport> = results.into_iter().flatten().collect();
        reports.sort_by(|a, b| a.path.cmp(&b.path));

        for report in &reports {
            for crash in &report.crashes {
                debug!("{}", crash);
            }
        }

        let summary = Summary::from_reports(&reports);
        let status = if interrupted {
            warn!(
                "Interrupted after inspecting {} of {} files",
                reports.len(),
                jobs.len()
            );
            RunStatus::Interrupted
        } else {
            RunStatus::from_reports(&reports, self.options.fail_level)
        };

        Ok(LintRun {
            reports,
            summary,
            status,
            config_warnings,
        })
    }
}

/// Identifies a layer stack by label, base directory and contents.
fn layers_key(layers: &[ConfigLayer]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for layer in layers {
        let base_dir = layer
            .base_dir
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let values = layer.to_json();
        for part in [layer.source.as_str(), base_dir.as_str(), values.as_str()] {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
    }
    hasher.finalize()
}
