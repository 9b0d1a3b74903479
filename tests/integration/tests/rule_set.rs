//! Integration tests for the bundled rule set
//!
//! Runs the full pipeline (configuration, directives, dispatch, filtering and
//! correction) over real rules through the library API.

use std::fs;
use std::sync::Arc;

use coplint_core::{
    ConfigError, ConfigLayer, CorrectionOutcome, FileReport, LintOptions, LintRun, Linter,
    LinterError, RuleRegistry, RunStatus, Severity, SourceInput, StaticConfig,
    SuppressionGenerator,
};
use coplint_parser::ScriptParser;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

fn linter(options: LintOptions) -> Linter {
    let mut registry = RuleRegistry::new();
    coplint_rules::register(&mut registry).unwrap();
    Linter::new(Arc::new(registry), Arc::new(ScriptParser::new()), options)
}

fn autocorrecting() -> LintOptions {
    LintOptions {
        autocorrect: true,
        ..LintOptions::default()
    }
}

fn run(options: LintOptions, config: &StaticConfig, files: &[(&str, &str)]) -> LintRun {
    let inputs = files
        .iter()
        .map(|(path, src)| SourceInput::new(*path, *src))
        .collect();
    linter(options).lint_sources(inputs, config).unwrap()
}

fn single(options: LintOptions, config: serde_json::Value, src: &str) -> FileReport {
    let config = StaticConfig::new(vec![ConfigLayer::from_value("test", config).unwrap()]);
    run(options, &config, &[("app.cop", src)]).reports.remove(0)
}

fn rules(report: &FileReport) -> Vec<&str> {
    report.offenses.iter().map(|o| o.rule.as_str()).collect()
}

mod inspection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reports_in_position_order() {
        let src = "x=1   \nname = \"hi\"\nn = 1000000\nbyebug\n";
        let report = single(LintOptions::default(), json!({}), src);

        assert_eq!(
            rules(&report),
            vec![
                "Layout/SpaceAroundOperators",
                "Layout/TrailingWhitespace",
                "Style/StringLiterals",
                "Style/NumericLiterals",
                "Lint/Debugger",
            ]
        );
        assert_eq!(report.correctable_count(), 4);
    }

    #[test]
    fn fail_level_separates_warnings_from_conventions() {
        let config = StaticConfig::default();
        let files = [("a.cop", "x = 1   \n"), ("b.cop", "byebug\n")];

        let at_warning = LintOptions {
            fail_level: Severity::Warning,
            ..LintOptions::default()
        };
        assert_eq!(run(at_warning, &config, &files).status, RunStatus::OffensesFound);

        let at_error = LintOptions {
            fail_level: Severity::Error,
            ..LintOptions::default()
        };
        let lint = run(at_error, &config, &files);
        assert_eq!(lint.status, RunStatus::Clean);
        assert_eq!(lint.summary.count(Severity::Warning), 1);
        assert_eq!(lint.summary.count(Severity::Convention), 1);
    }

    #[test]
    fn syntax_errors_stop_other_rules() {
        let report = single(LintOptions::default(), json!({}), "x = 1 2   \n");

        assert_eq!(rules(&report), vec!["Lint/Syntax"]);
        assert_eq!(report.offenses[0].severity, Severity::Fatal);
        assert!(report.crashes.is_empty());
    }

    #[test]
    fn severity_overrides_apply() {
        let report = single(
            LintOptions::default(),
            json!({ "Layout/TrailingWhitespace": { "Severity": "error" } }),
            "x = 1 \n",
        );
        assert_eq!(report.offenses[0].severity, Severity::Error);
    }
}

mod directives {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disabled_ranges_silence_rules() {
        let src = "# coplint:disable Lint/Debugger\nbyebug\n# coplint:enable Lint/Debugger\ndebugger\n";
        let report = single(LintOptions::default(), json!({}), src);

        assert_eq!(rules(&report), vec!["Lint/Debugger"]);
        assert_eq!(report.offenses[0].line(), 4);
    }

    #[test]
    fn unused_disables_are_reported() {
        let report = single(
            LintOptions::default(),
            json!({}),
            "x = 1 # coplint:disable Lint/Debugger\n",
        );

        assert_eq!(rules(&report), vec!["Lint/RedundantDisableDirective"]);
        assert_eq!(
            report.offenses[0].message,
            "Unnecessary disabling of `Lint/Debugger`."
        );
    }

    #[test]
    fn disabled_offenses_are_not_corrected() {
        let src = "x=1 # coplint:disable Layout/SpaceAroundOperators\n";
        let report = single(autocorrecting(), json!({}), src);

        assert!(report.offenses.is_empty());
        assert!(report.corrected.is_empty());
        assert_eq!(report.corrected_source, None);
    }
}

mod autocorrect {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn corrections_from_several_rules_converge() {
        let src = "x=\"a\"   \nn = 1000000\n";
        let report = single(autocorrecting(), json!({}), src);

        assert_eq!(report.corrected_source.as_deref(), Some("x = 'a'\nn = 1_000_000\n"));
        assert!(report.offenses.is_empty());

        let mut corrected: Vec<&str> = report.corrected.iter().map(|o| o.rule.as_str()).collect();
        corrected.sort_unstable();
        assert_eq!(
            corrected,
            vec![
                "Layout/SpaceAroundOperators",
                "Layout/TrailingWhitespace",
                "Style/NumericLiterals",
                "Style/StringLiterals",
            ]
        );
        let correction = report.correction.as_ref().unwrap();
        assert_eq!(correction.outcome, CorrectionOutcome::Converged);
    }

    #[test]
    fn uncorrectable_offenses_remain() {
        let report = single(autocorrecting(), json!({}), "byebug   \n");

        assert_eq!(report.corrected_source.as_deref(), Some("byebug\n"));
        assert_eq!(rules(&report), vec!["Lint/Debugger"]);
    }

    #[test]
    fn disabled_corrections_are_offered_but_not_applied() {
        let report = single(
            autocorrecting(),
            json!({ "Layout/TrailingWhitespace": { "AutoCorrect": false } }),
            "x = 1 \n",
        );

        assert_eq!(report.corrected_source, None);
        assert_eq!(rules(&report), vec!["Layout/TrailingWhitespace"]);
    }

    #[test]
    fn redundant_directives_are_removed() {
        let report = single(
            autocorrecting(),
            json!({}),
            "x = 1 # coplint:disable Lint/Debugger\n",
        );

        let source = report.corrected_source.unwrap();
        assert!(!source.contains("coplint:disable"));
        assert!(source.starts_with("x = 1"));
    }

    #[test]
    fn preferred_style_follows_configuration() {
        let report = single(
            autocorrecting(),
            json!({ "Style/StringLiterals": { "EnforcedStyle": "double_quotes" } }),
            "a = 'x'\nb = \"y\"\n",
        );
        assert_eq!(report.corrected_source.as_deref(), Some("a = \"x\"\nb = \"y\"\n"));
    }
}

mod configuration {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config_error(config: serde_json::Value) -> ConfigError {
        let config = StaticConfig::new(vec![ConfigLayer::from_value("test", config).unwrap()]);
        let inputs = vec![SourceInput::new("app.cop", "x = 1\n")];
        match linter(LintOptions::default()).lint_sources(inputs, &config) {
            Err(LinterError::Config(e)) => e,
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn renamed_rules_are_fatal() {
        let err = config_error(json!({ "Style/DoubleQuotes": { "Enabled": false } }));
        assert!(matches!(err, ConfigError::ObsoleteRule { .. }));
        assert!(err.to_string().contains("Style/StringLiterals"));
    }

    #[test]
    fn unknown_rules_suggest_a_name() {
        let err = config_error(json!({ "Layout/LineLenght": { "Max": 100 } }));
        assert!(err.to_string().contains("Did you mean `Layout/LineLength`?"));
    }

    #[test]
    fn unsupported_styles_are_rejected() {
        let err = config_error(json!({ "Style/StringLiterals": { "EnforcedStyle": "backticks" } }));
        assert!(matches!(err, ConfigError::InvalidEnforcedStyle { .. }));
    }

    #[test]
    fn renamed_parameters_warn() {
        let config = StaticConfig::new(vec![
            ConfigLayer::from_value("test", json!({ "Layout/LineLength": { "IgnoredPatterns": [] } }))
                .unwrap(),
        ]);
        let lint = run(LintOptions::default(), &config, &[("a.cop", "x = 1\n"), ("b.cop", "y = 2\n")]);

        assert_eq!(lint.config_warnings.len(), 1);
        assert!(lint.config_warnings[0].to_string().contains("AllowedPatterns"));
    }

    #[test]
    fn patterns_are_relative_to_the_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".coplint.json");
        fs::write(
            &path,
            r#"{
                "AllCops": { "Exclude": ["tmp/**"] },
                // Generated code keeps its blanks.
                "Layout/TrailingWhitespace": { "Exclude": ["gen/*.cop"] },
            }"#,
        )
        .unwrap();
        let config = StaticConfig::new(vec![ConfigLayer::from_file(&path).unwrap()]);
        let files: Vec<(String, &str)> = ["app.cop", "gen/out.cop", "tmp/scratch.cop"]
            .into_iter()
            .map(|name| (dir.path().join(name).display().to_string(), "x = 1 \n"))
            .collect();
        let files: Vec<(&str, &str)> = files.iter().map(|(p, s)| (p.as_str(), *s)).collect();

        let lint = run(LintOptions::default(), &config, &files);

        assert_eq!(lint.summary.files_inspected, 2);
        let flagged: Vec<_> = lint
            .reports
            .iter()
            .filter(|r| !r.offenses.is_empty())
            .map(|r| r.path.clone())
            .collect();
        assert_eq!(flagged, vec![dir.path().join("app.cop")]);
    }
}

mod suppressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generated_layer_silences_every_offense() {
        let files = [
            ("a.cop", "x = 1 \n"),
            ("b.cop", "byebug\n"),
            ("c.cop", "y = 2 \n"),
        ];
        let first = run(LintOptions::default(), &StaticConfig::default(), &files);
        assert_eq!(first.summary.offenses, 3);

        let mut generator = SuppressionGenerator::new(1);
        for report in &first.reports {
            generator.add_file(&report.path.display().to_string(), &report.offenses);
        }
        let rendered = generator.render();
        assert!(rendered.contains("\"Enabled\": false"));
        assert!(rendered.contains("\"b.cop\""));

        let layer = ConfigLayer::from_jsonc("todo", &rendered).unwrap();
        let second = run(LintOptions::default(), &StaticConfig::new(vec![layer]), &files);
        assert_eq!(second.summary.offenses, 0);
        assert_eq!(second.status, RunStatus::Clean);
    }
}
