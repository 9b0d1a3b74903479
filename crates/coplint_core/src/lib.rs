//! # coplint_core
//!
//! Core engine for coplint.
//!
//! This crate provides:
//! - The [`RuleRegistry`] every run is built around
//! - Configuration layering and per-file resolution
//! - Inline directive handling and offense filtering
//! - The autocorrection loop
//! - The parallel [`Linter`] driver and suppression-config generation
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coplint_core::{LintOptions, Linter, RuleRegistry, SourceInput, StaticConfig};
//! use coplint_parser::ScriptParser;
//!
//! let linter = Linter::new(
//!     Arc::new(RuleRegistry::new()),
//!     Arc::new(ScriptParser::new()),
//!     LintOptions::default(),
//! );
//! let run = linter.lint_sources(
//!     vec![SourceInput::new("app.cop", "x = 1\n")],
//!     &StaticConfig::default(),
//! )?;
//! for report in &run.reports {
//!     println!("{}: {} offenses", report.path.display(), report.offenses.len());
//! }
//! std::process::exit(run.status.exit_code());
//! ```

pub mod builtin;
mod config;
mod corrector;
pub mod directive;
pub mod dispatch;
mod error;
mod file_linter;
pub mod filter;
pub mod fixer;
mod linter;
mod obsoletion;
mod registry;
pub mod resolver;
mod result;
mod suppressions;

pub use config::{ConfigLayer, ConfigSource, StaticConfig, merge_values};
pub use corrector::{CorrectionOutcome, CorrectionReport, CorrectionRun, Corrector, PassResult};
pub use directive::{DirectiveSet, DirectiveWarning};
pub use dispatch::{Dispatcher, RuleCrash};
pub use error::{ConfigError, CorrectionError, LinterError, RegistryError};
pub use file_linter::FileLinter;
pub use linter::{LintOptions, Linter, SourceInput};
pub use obsoletion::{ObsoletionSeverity, Obsoletions, ParameterObsoletion, RuleObsoletion};
pub use registry::{NameResolution, RuleRegistry};
pub use resolver::{ConfigResolver, ConfigWarning, EffectiveConfig, PreparedConfig};
pub use result::{FileReport, LintRun, RunStatus, Summary};
pub use suppressions::{DEFAULT_MAX_EXCLUSIONS, SuppressionEntry, SuppressionGenerator};

pub use coplint_plugin::{CorrectionStatus, Edit, Offense, RuleConfig, Severity};
