//! coplint CLI
//!
//! Static analysis and autocorrection for coplint scripts.

mod cli;
mod config;
mod files;
mod output;
mod signal;
mod write;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use coplint_core::{
    ConfigLayer, LintOptions, LintRun, Linter, RuleRegistry, RunStatus, SourceInput,
    SuppressionGenerator,
};
use coplint_parser::{Parser as _, ScriptParser};
use miette::{IntoDiagnostic, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::DirectoryConfig;

/// File written by `--auto-gen-config`, in the working directory.
const TODO_FILE: &str = ".coplint_todo.json";

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(status) => ExitCode::from(u8::try_from(status.exit_code()).unwrap_or(2)),
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<RunStatus> {
    let cwd = std::env::current_dir().into_diagnostic()?;

    let mut registry = RuleRegistry::new();
    coplint_rules::register(&mut registry).into_diagnostic()?;
    let parser = ScriptParser::new();

    let files = files::discover(&cli.paths, &cwd, parser.extensions());

    let explicit = match &cli.config {
        Some(path) => Some(ConfigLayer::from_file(files::absolute(&cwd, path)).into_diagnostic()?),
        None => None,
    };
    let config = DirectoryConfig::new(explicit);

    let options = LintOptions {
        autocorrect: cli.autocorrect,
        fail_level: cli.fail_level,
        timings: cli.timings,
        max_correction_passes: None,
    };
    let linter = Linter::new(Arc::new(registry), Arc::new(parser), options);
    signal::install(linter.abort_handle());

    let inputs = files
        .into_iter()
        .filter_map(|path| match fs::read(&path) {
            Ok(contents) => Some(SourceInput::new(path, contents)),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    let run = linter.lint_sources(inputs, &config).into_diagnostic()?;
    report_problems(&run, &cwd);

    if cli.autocorrect {
        write_corrections(&run, &cwd);
    }

    if cli.auto_gen_config {
        generate_todo(&run, &cwd, cli.exclude_limit)?;
    }

    output::output_text(&run, &cwd, cli.autocorrect, cli.timings);

    // Offenses recorded in the generated file do not fail the run.
    Ok(match run.status {
        RunStatus::OffensesFound if cli.auto_gen_config => RunStatus::Clean,
        status => status,
    })
}

fn report_problems(run: &LintRun, cwd: &Path) {
    for warning in &run.config_warnings {
        warn!("{}", warning);
    }
    for report in &run.reports {
        let path = files::display(&report.path, cwd);
        for warning in &report.warnings {
            warn!("{}: {}", path, warning);
        }
        for crash in &report.crashes {
            warn!("{}", crash);
        }
    }
}

fn write_corrections(run: &LintRun, cwd: &Path) {
    let mut written = 0;
    for report in &run.reports {
        let Some(source) = &report.corrected_source else {
            continue;
        };
        let path = files::display(&report.path, cwd);
        match write::overwrite(&report.path, source) {
            Ok(()) => {
                debug!("Corrected {}", path);
                written += 1;
            }
            Err(e) => error!("Failed to write {}: {:?}", path, e),
        }
    }
    if written > 0 {
        info!("Rewrote {} files", written);
    }
}

fn generate_todo(run: &LintRun, cwd: &Path, exclude_limit: usize) -> Result<()> {
    let mut generator = SuppressionGenerator::new(exclude_limit);
    for report in &run.reports {
        generator.add_file(&files::display(&report.path, cwd), &report.offenses);
    }

    let path = cwd.join(TODO_FILE);
    write::replace(&path, &generator.render())?;
    info!("Created {}. Apply it with `--config {}`", TODO_FILE, TODO_FILE);
    Ok(())
}
