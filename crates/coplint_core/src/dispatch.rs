//! Runs the enabled rules over one parsed document.
//!
//! Every enabled rule is instantiated fresh for the file. The tree is
//! walked once in pre-order; at each node the rules interested in its kind
//! run in registration order. After the walk each rule's `finish` hook runs,
//! again in registration order.
//!
//! A rule that panics or returns an error is recorded as crashed and skipped
//! for the rest of the file. Offenses it reported before crashing are kept.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use coplint_ast::{NodeKind, SourceDocument};
use coplint_plugin::{Edit, Offense, Rule, RuleConfig, RuleContext, RuleDescriptor, RuleError};
use tracing::{debug, warn};

use crate::registry::RuleRegistry;
use crate::resolver::EffectiveConfig;

/// An offense together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOffense {
    pub offense: Offense,
    /// Registration index of the reporting rule.
    pub slot: usize,
    /// Emission order within the pass.
    pub seq: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Check,
    Finish,
    Correct,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "starting",
            Phase::Check => "inspecting",
            Phase::Finish => "finishing",
            Phase::Correct => "correcting",
        })
    }
}

/// A rule that failed on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCrash {
    pub rule: String,
    pub phase: Phase,
    pub path: Option<PathBuf>,
    pub line: Option<u32>,
    pub message: String,
}

impl fmt::Display for RuleCrash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "An error occurred while {} was {}", self.rule, self.phase)?;
        if let Some(path) = &self.path {
            write!(f, " {}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        } else if let Some(line) = self.line {
            write!(f, " line {line}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// One enabled rule instance for the current file.
pub struct ActiveRule<'a> {
    pub slot: usize,
    pub descriptor: &'a RuleDescriptor,
    pub config: &'a RuleConfig,
    rule: Box<dyn Rule>,
    crashed: bool,
    timed: bool,
    elapsed: Duration,
}

impl fmt::Debug for ActiveRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRule")
            .field("slot", &self.slot)
            .field("name", &self.name())
            .field("crashed", &self.crashed)
            .finish_non_exhaustive()
    }
}

impl<'a> ActiveRule<'a> {
    pub fn name(&self) -> &'static str {
        self.descriptor.meta.name
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed
    }

    /// Time spent inside the rule, if timing was requested.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// True if this rule may correct its offenses in this run.
    pub fn can_correct(&self) -> bool {
        self.descriptor.meta.autocorrect && self.config.autocorrect
    }

    /// Asks the rule for the edit that fixes `offense`.
    pub fn correct(&mut self, offense: &Offense, document: &SourceDocument) -> Result<Option<Edit>, RuleCrash> {
        self.invoke(Phase::Correct, document, Some(offense.line()), |rule, cx| {
            rule.correct(offense, cx)
        })
    }

    fn invoke<T>(
        &mut self,
        phase: Phase,
        document: &SourceDocument,
        line: Option<u32>,
        f: impl FnOnce(&mut dyn Rule, &RuleContext<'_>) -> Result<T, RuleError>,
    ) -> Result<T, RuleCrash> {
        let descriptor = self.descriptor;
        let cx = RuleContext::new(&descriptor.meta, self.config, document);
        let started = self.timed.then(Instant::now);
        let rule = self.rule.as_mut();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(rule, &cx)));
        if let Some(started) = started {
            self.elapsed += started.elapsed();
        }

        let message = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.crashed = true;
        let crash = RuleCrash {
            rule: descriptor.meta.name.to_string(),
            phase,
            path: document.path().map(Path::to_path_buf),
            line,
            message,
        };
        warn!("{}", crash);
        Err(crash)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// Everything one dispatch produced.
#[derive(Debug)]
pub struct Dispatch<'a> {
    /// Enabled rules in registration order.
    pub rules: Vec<ActiveRule<'a>>,
    pub offenses: Vec<RawOffense>,
    pub crashes: Vec<RuleCrash>,
}

impl<'a> Dispatch<'a> {
    pub fn rule_mut(&mut self, slot: usize) -> Option<&mut ActiveRule<'a>> {
        let index = self.rules.binary_search_by_key(&slot, |r| r.slot).ok()?;
        self.rules.get_mut(index)
    }

    /// Per-rule time spent, for rules that ran.
    pub fn timings(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.rules
            .iter()
            .filter(|r| r.timed)
            .map(|r| (r.name(), r.elapsed))
    }
}

/// Drives rules over documents.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    registry: &'a RuleRegistry,
    timings: bool,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self {
            registry,
            timings: false,
        }
    }

    /// Records time spent per rule.
    pub fn with_timings(mut self, timings: bool) -> Self {
        self.timings = timings;
        self
    }

    /// Runs every rule `config` enables over `document`.
    pub fn run(&self, document: &SourceDocument, config: &'a EffectiveConfig) -> Dispatch<'a> {
        let mut crashes = Vec::new();
        let mut rules = Vec::new();
        for (slot, descriptor) in self.registry.iter().enumerate() {
            let Some(rule_config) = config.get(descriptor.meta.name).filter(|c| c.enabled) else {
                continue;
            };
            match panic::catch_unwind(AssertUnwindSafe(|| descriptor.instantiate())) {
                Ok(rule) => rules.push(ActiveRule {
                    slot,
                    descriptor,
                    config: rule_config,
                    rule,
                    crashed: false,
                    timed: self.timings,
                    elapsed: Duration::ZERO,
                }),
                Err(payload) => {
                    let crash = RuleCrash {
                        rule: descriptor.meta.name.to_string(),
                        phase: Phase::Setup,
                        path: document.path().map(Path::to_path_buf),
                        line: None,
                        message: panic_message(payload.as_ref()),
                    };
                    warn!("{}", crash);
                    crashes.push(crash);
                }
            }
        }
        debug!("Dispatching {} rules", rules.len());

        let mut table: Vec<Vec<usize>> = vec![Vec::new(); NodeKind::ALL.len()];
        for (i, active) in rules.iter().enumerate() {
            for kind in NodeKind::ALL {
                if active.descriptor.meta.interest.wants(kind) {
                    table[kind.index()].push(i);
                }
            }
        }

        let mut offenses = Vec::new();
        let mut seq = 0;
        let mut record = |slot: usize, found: Vec<Offense>, offenses: &mut Vec<RawOffense>| {
            for offense in found {
                offenses.push(RawOffense { offense, slot, seq });
                seq += 1;
            }
        };

        for node in document.tree().root().descendants() {
            for &i in &table[node.kind().index()] {
                let active = &mut rules[i];
                if active.crashed {
                    continue;
                }
                let line = document.buffer().position(node.span().start).line;
                match active.invoke(Phase::Check, document, Some(line), |rule, cx| rule.check(node, cx)) {
                    Ok(found) => record(active.slot, found, &mut offenses),
                    Err(crash) => crashes.push(crash),
                }
            }
        }

        for active in rules.iter_mut().filter(|r| !r.crashed) {
            match active.invoke(Phase::Finish, document, None, |rule, cx| rule.finish(cx)) {
                Ok(found) => record(active.slot, found, &mut offenses),
                Err(crash) => crashes.push(crash),
            }
        }

        Dispatch {
            rules,
            offenses,
            crashes,
        }
    }
}
