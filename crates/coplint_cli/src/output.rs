//! Text output formatter

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use coplint_core::{CorrectionStatus, FileReport, LintRun, Offense, Summary};

use crate::files;

pub fn output_text(run: &LintRun, cwd: &Path, autocorrect: bool, timings: bool) {
    for report in &run.reports {
        let path = files::display(&report.path, cwd);
        for line in report_lines(&path, report) {
            println!("{}", line);
        }
    }

    println!();
    println!("{}", summary_line(&run.summary, autocorrect));

    if timings {
        print!("{}", timings_table(&run.reports));
    }
}

/// Remaining and corrected offenses of one file, in reporting order.
pub fn report_lines(path: &str, report: &FileReport) -> Vec<String> {
    let mut offenses: Vec<&Offense> = report.offenses.iter().chain(&report.corrected).collect();
    offenses.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    offenses.into_iter().map(|o| offense_line(path, o)).collect()
}

/// `path:line:column: S: [Marker] Department/Name: message`, column 1-based.
pub fn offense_line(path: &str, offense: &Offense) -> String {
    let marker = match offense.correction {
        CorrectionStatus::Corrected => "[Corrected] ",
        CorrectionStatus::Correctable | CorrectionStatus::Withheld => "[Correctable] ",
        CorrectionStatus::Uncorrectable => "",
    };
    format!(
        "{}:{}:{}: {}: {}{}: {}",
        path,
        offense.location.start.line,
        offense.location.start.column + 1,
        offense.severity.code(),
        marker,
        offense.rule,
        offense.message
    )
}

pub fn summary_line(summary: &Summary, autocorrect: bool) -> String {
    let detected = summary.offenses + summary.corrected;
    let mut line = format!(
        "{} inspected, {} detected",
        plural(summary.files_inspected, "file"),
        plural(detected, "offense"),
    );
    if autocorrect {
        let _ = write!(line, ", {} corrected", plural(summary.corrected, "offense"));
    }
    if summary.correctable > 0 {
        let _ = write!(
            line,
            ", {} autocorrectable",
            plural(summary.correctable, "offense")
        );
    }
    line
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else if count == 0 {
        format!("no {}s", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Time per rule summed over every file, slowest first.
pub fn timings_table(reports: &[FileReport]) -> String {
    let mut total_duration = Duration::new(0, 0);
    let mut rule_timings: HashMap<&str, Duration> = HashMap::new();

    for report in reports {
        for (rule, duration) in &report.timings {
            *rule_timings.entry(rule.as_str()).or_default() += *duration;
            total_duration += *duration;
        }
    }

    let mut out = String::new();
    if rule_timings.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nPerformance Timings:");
    let _ = writeln!(out, "{:<30} | {:<15} | {:<10}", "Rule", "Duration", "%");
    let _ = writeln!(out, "{:-<30}-+-{:-<15}-+-{:-<10}", "", "", "");

    let mut sorted_timings: Vec<_> = rule_timings.into_iter().collect();
    sorted_timings.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    for (rule, duration) in sorted_timings {
        let percentage = if total_duration.as_secs_f64() > 0.0 {
            (duration.as_secs_f64() / total_duration.as_secs_f64()) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "{:<30} | {:<15} | {:<10.1}%",
            rule,
            format!("{:?}", duration),
            percentage
        );
    }
    let _ = writeln!(out, "{:-<30}-+-{:-<15}-+-{:-<10}", "", "", "");
    let _ = writeln!(out, "{:<30} | {:<15}", "Total", format!("{:?}", total_duration));
    out
}
