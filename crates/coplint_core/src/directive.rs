//! In-source directives that switch rules off and on.
//!
//! Supported forms:
//! - `# coplint:disable Layout/LineLength` - on its own line, disables the
//!   rule until a matching `enable` or the end of the file
//! - `x = 1 # coplint:disable Style` - after code, disables the whole
//!   department on that line only
//! - `# coplint:enable all` - re-enables everything
//! - `# coplint:todo Lint/Debugger` - same as `disable`
//!
//! Targets are separated by commas. Anything after `--` is a free-form
//! note.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::LazyLock;

use coplint_ast::{Comment, SourceDocument, Span};
use regex::Regex;

use crate::registry::{NameResolution, RuleRegistry};

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*coplint\s*:\s*(disable|enable|todo)\b").expect("directive pattern is valid")
});

static TARGET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(?:/[A-Za-z][A-Za-z0-9_]*)?$")
        .expect("target pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Disable,
    Enable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveScope {
    /// A trailing comment; affects its own line.
    Line,
    /// An own-line comment; affects every following line until closed.
    Range,
}

/// What a directive target refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    /// A rule, or every rule of a department.
    Rules(Vec<&'static str>),
    /// Unknown or ambiguous; has no effect.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveTarget {
    /// The name as written.
    pub name: String,
    pub span: Span,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub scope: DirectiveScope,
    /// 1-indexed line of the comment.
    pub line: u32,
    pub comment: Span,
    pub targets: Vec<DirectiveTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveWarningKind {
    MissingDepartment { qualified: String },
    WrongDepartment { qualified: String },
    Ambiguous { candidates: Vec<String> },
    Unknown,
    Malformed,
}

/// A directive target that could not be taken at face value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveWarning {
    pub line: u32,
    pub name: String,
    pub kind: DirectiveWarningKind,
}

impl fmt::Display for DirectiveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            DirectiveWarningKind::MissingDepartment { qualified } => {
                write!(f, "no department given for {name}; assuming {qualified}")
            }
            DirectiveWarningKind::WrongDepartment { qualified } => {
                let department = qualified.split_once('/').map_or("", |(d, _)| d);
                write!(f, "{name} has the wrong namespace - should be {department}")
            }
            DirectiveWarningKind::Ambiguous { candidates } => {
                write!(f, "{name} is ambiguous; it could mean {}", candidates.join(", "))
            }
            DirectiveWarningKind::Unknown => write!(f, "unknown rule or department {name}"),
            DirectiveWarningKind::Malformed => write!(f, "malformed directive target `{name}`"),
        }
    }
}

/// Identifies one target of one directive: `(directive index, target index)`.
pub type TargetRef = (usize, usize);

#[derive(Debug, Clone)]
struct DisabledRange {
    origin: TargetRef,
    /// `None` disables every rule.
    rule: Option<&'static str>,
    start: u32,
    end: u32,
    /// Rules re-enabled inside an all-rules range.
    exceptions: Vec<(&'static str, u32, u32)>,
}

impl DisabledRange {
    fn covers(&self, line: u32, rule: &str) -> bool {
        if line < self.start || line > self.end {
            return false;
        }
        match self.rule {
            Some(name) => name == rule,
            None => !self
                .exceptions
                .iter()
                .any(|(name, start, end)| *name == rule && *start <= line && line <= *end),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Open {
    origin: TargetRef,
    start: u32,
}

#[derive(Debug)]
struct OpenAll {
    open: Open,
    exceptions: Vec<(&'static str, u32, u32)>,
    reenabled: BTreeMap<&'static str, u32>,
}

impl OpenAll {
    fn new(origin: TargetRef, start: u32) -> Self {
        Self {
            open: Open { origin, start },
            exceptions: Vec::new(),
            reenabled: BTreeMap::new(),
        }
    }

    fn close(mut self, end: u32) -> DisabledRange {
        self.exceptions
            .extend(self.reenabled.into_iter().map(|(name, start)| (name, start, end)));
        DisabledRange {
            origin: self.open.origin,
            rule: None,
            start: self.open.start,
            end,
            exceptions: self.exceptions,
        }
    }
}

#[derive(Debug, Default)]
struct RangeState {
    all: Option<OpenAll>,
    rules: BTreeMap<&'static str, Open>,
}

impl RangeState {
    fn is_disabled(&self, rule: &str) -> bool {
        self.rules.contains_key(rule)
            || self
                .all
                .as_ref()
                .is_some_and(|all| !all.reenabled.contains_key(rule))
    }
}

/// Rules disabled on one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineState {
    /// Every rule is disabled, except those in `except`.
    pub all: bool,
    pub except: Vec<&'static str>,
    pub rules: Vec<&'static str>,
}

/// The directives of one file, with the line ranges they disable.
#[derive(Debug, Clone, Default)]
pub struct DirectiveSet {
    directives: Vec<Directive>,
    ranges: Vec<DisabledRange>,
    line_enables: Vec<(u32, Option<&'static str>)>,
    redundant_enables: Vec<TargetRef>,
    warnings: Vec<DirectiveWarning>,
}

impl DirectiveSet {
    /// Finds and interprets every directive comment in `document`.
    pub fn parse(document: &SourceDocument, registry: &RuleRegistry) -> Self {
        let buffer = document.buffer();
        let mut set = Self::default();
        let mut state = RangeState::default();

        for comment in document.comments() {
            let line = comment.line(buffer);
            let Some((kind, targets)) = parse_comment(comment, line, registry, &mut set.warnings)
            else {
                continue;
            };
            let scope = if comment.is_trailing(buffer) {
                DirectiveScope::Line
            } else {
                DirectiveScope::Range
            };
            let directive = Directive {
                kind,
                scope,
                line,
                comment: comment.span,
                targets,
            };
            let id = set.directives.len();
            match (scope, kind) {
                (DirectiveScope::Range, DirectiveKind::Disable) => set.open_ranges(&mut state, id, &directive),
                (DirectiveScope::Range, DirectiveKind::Enable) => set.close_ranges(&mut state, id, &directive),
                (DirectiveScope::Line, DirectiveKind::Disable) => set.disable_line(id, &directive),
                (DirectiveScope::Line, DirectiveKind::Enable) => set.enable_line(&state, id, &directive),
            }
            set.directives.push(directive);
        }

        if let Some(all) = state.all.take() {
            set.ranges.push(all.close(u32::MAX));
        }
        for (rule, open) in mem::take(&mut state.rules) {
            set.push_rule_range(open, rule, u32::MAX);
        }
        set
    }

    fn push_rule_range(&mut self, open: Open, rule: &'static str, end: u32) {
        self.ranges.push(DisabledRange {
            origin: open.origin,
            rule: Some(rule),
            start: open.start,
            end,
            exceptions: Vec::new(),
        });
    }

    fn open_ranges(&mut self, state: &mut RangeState, id: usize, directive: &Directive) {
        let line = directive.line;
        for (t, target) in directive.targets.iter().enumerate() {
            let origin = (id, t);
            match &target.target {
                Target::All => match state.all.take() {
                    None => state.all = Some(OpenAll::new(origin, line)),
                    // Re-disabling everything while some rules are re-enabled
                    // starts a fresh range.
                    Some(all) if !all.reenabled.is_empty() => {
                        self.ranges.push(all.close(line - 1));
                        state.all = Some(OpenAll::new(origin, line));
                    }
                    Some(all) => state.all = Some(all),
                },
                Target::Rules(names) => {
                    for &name in names {
                        if state.rules.contains_key(name) {
                            continue;
                        }
                        if let Some(all) = state.all.as_mut() {
                            let Some(start) = all.reenabled.remove(name) else {
                                continue;
                            };
                            all.exceptions.push((name, start, line - 1));
                        }
                        state.rules.insert(name, Open { origin, start: line });
                    }
                }
                Target::Inert => {}
            }
        }
    }

    fn close_ranges(&mut self, state: &mut RangeState, id: usize, directive: &Directive) {
        let end = directive.line - 1;
        for (t, target) in directive.targets.iter().enumerate() {
            let mut effective = false;
            match &target.target {
                Target::All => {
                    if let Some(all) = state.all.take() {
                        self.ranges.push(all.close(end));
                        effective = true;
                    }
                    for (rule, open) in mem::take(&mut state.rules) {
                        self.push_rule_range(open, rule, end);
                        effective = true;
                    }
                }
                Target::Rules(names) => {
                    for &name in names {
                        if let Some(open) = state.rules.remove(name) {
                            self.push_rule_range(open, name, end);
                            effective = true;
                        }
                        if let Some(all) = state.all.as_mut()
                            && !all.reenabled.contains_key(name)
                        {
                            all.reenabled.insert(name, directive.line);
                            effective = true;
                        }
                    }
                }
                Target::Inert => {}
            }
            if !effective {
                self.redundant_enables.push((id, t));
            }
        }
    }

    fn disable_line(&mut self, id: usize, directive: &Directive) {
        let line = directive.line;
        for (t, target) in directive.targets.iter().enumerate() {
            let rules: Vec<Option<&'static str>> = match &target.target {
                Target::All => vec![None],
                Target::Rules(names) => names.iter().map(|&n| Some(n)).collect(),
                Target::Inert => continue,
            };
            for rule in rules {
                self.ranges.push(DisabledRange {
                    origin: (id, t),
                    rule,
                    start: line,
                    end: line,
                    exceptions: Vec::new(),
                });
            }
        }
    }

    fn enable_line(&mut self, state: &RangeState, id: usize, directive: &Directive) {
        let line = directive.line;
        for (t, target) in directive.targets.iter().enumerate() {
            let lifted: Vec<Option<&'static str>> = match &target.target {
                Target::All if state.all.is_some() || !state.rules.is_empty() => vec![None],
                Target::Rules(names) => names
                    .iter()
                    .filter(|name| state.is_disabled(name))
                    .map(|&n| Some(n))
                    .collect(),
                _ => Vec::new(),
            };
            if lifted.is_empty() {
                self.redundant_enables.push((id, t));
            }
            self.line_enables
                .extend(lifted.into_iter().map(|rule| (line, rule)));
        }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn directive(&self, id: usize) -> Option<&Directive> {
        self.directives.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn warnings(&self) -> &[DirectiveWarning] {
        &self.warnings
    }

    /// Enable targets that re-enabled nothing.
    pub fn redundant_enables(&self) -> &[TargetRef] {
        &self.redundant_enables
    }

    /// The directive targets that disable `rule` on `line`.
    pub fn disabled_by(&self, line: u32, rule: &str) -> Vec<TargetRef> {
        let lifted = self
            .line_enables
            .iter()
            .any(|(l, r)| *l == line && r.is_none_or(|r| r == rule));
        if lifted {
            return Vec::new();
        }
        self.ranges
            .iter()
            .filter(|range| range.covers(line, rule))
            .map(|range| range.origin)
            .collect()
    }

    pub fn is_disabled(&self, line: u32, rule: &str) -> bool {
        !self.disabled_by(line, rule).is_empty()
    }

    /// Summary of what is disabled on `line`.
    ///
    /// Trailing `enable` comments are not reflected.
    pub fn disabled_on(&self, line: u32) -> LineState {
        let mut state = LineState::default();
        for range in self.ranges.iter().filter(|r| r.start <= line && line <= r.end) {
            match range.rule {
                Some(rule) => {
                    if !state.rules.contains(&rule) {
                        state.rules.push(rule);
                    }
                }
                None => {
                    state.all = true;
                    state.except.extend(
                        range
                            .exceptions
                            .iter()
                            .filter(|(_, start, end)| *start <= line && line <= *end)
                            .map(|(name, _, _)| *name),
                    );
                }
            }
        }
        state.rules.sort_unstable();
        state.except.sort_unstable();
        state.except.dedup();
        state
    }
}

/// Parses one comment; `None` if it is not a directive.
fn parse_comment(
    comment: &Comment,
    line: u32,
    registry: &RuleRegistry,
    warnings: &mut Vec<DirectiveWarning>,
) -> Option<(DirectiveKind, Vec<DirectiveTarget>)> {
    let captures = DIRECTIVE.captures(&comment.text)?;
    let head = captures.get(0)?;
    let kind = match captures.get(1)?.as_str() {
        "enable" => DirectiveKind::Enable,
        _ => DirectiveKind::Disable,
    };

    let rest = &comment.text[head.end()..];
    let rest = rest.split_once("--").map_or(rest, |(targets, _note)| targets);

    let mut targets = Vec::new();
    let mut offset = head.end();
    for piece in rest.split(',') {
        let piece_start = offset;
        offset += piece.len() + 1;
        let name = piece.trim();
        if name.is_empty() {
            continue;
        }
        let leading = piece.len() - piece.trim_start().len();
        let start = comment.span.start + (piece_start + leading) as u32;
        let span = Span::new(start, start + name.len() as u32);
        if !TARGET_NAME.is_match(name) {
            warnings.push(DirectiveWarning {
                line,
                name: name.to_string(),
                kind: DirectiveWarningKind::Malformed,
            });
            continue;
        }
        targets.push(DirectiveTarget {
            name: name.to_string(),
            span,
            target: resolve_target(name, line, registry, warnings),
        });
    }

    if targets.is_empty() {
        return None;
    }
    Some((kind, targets))
}

fn resolve_target(
    name: &str,
    line: u32,
    registry: &RuleRegistry,
    warnings: &mut Vec<DirectiveWarning>,
) -> Target {
    if name == "all" {
        return Target::All;
    }
    if registry.is_department(name) {
        return Target::Rules(registry.rules_in(name));
    }
    if let Some(descriptor) = registry.get(name) {
        return Target::Rules(vec![descriptor.meta.name]);
    }

    let mut warn = |kind| {
        warnings.push(DirectiveWarning {
            line,
            name: name.to_string(),
            kind,
        })
    };
    let short = name.split_once('/').map_or(name, |(_, short)| short);
    match registry.resolve_short_name(short) {
        NameResolution::Unique(meta) if short == name => {
            warn(DirectiveWarningKind::MissingDepartment {
                qualified: meta.name.to_string(),
            });
            Target::Rules(vec![meta.name])
        }
        NameResolution::Unique(meta) => {
            warn(DirectiveWarningKind::WrongDepartment {
                qualified: meta.name.to_string(),
            });
            Target::Rules(vec![meta.name])
        }
        NameResolution::Ambiguous(candidates) if short == name => {
            warn(DirectiveWarningKind::Ambiguous {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            });
            Target::Inert
        }
        _ => {
            warn(DirectiveWarningKind::Unknown);
            Target::Inert
        }
    }
}
