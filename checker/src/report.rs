// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::address_space::is_address;
use crate::program::NodeId;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result};

/// The value of one variable or memory object in a counterexample model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModelValue {
    pub name: String,
    pub value: i64,
}

/// Addresses are shown in hexadecimal, scalars in decimal.
impl Display for ModelValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if is_address(self.value) {
            write!(f, "{} = {:#x}", self.name, self.value)
        } else {
            write!(f, "{} = {}", self.name, self.value)
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Counterexample {
    pub values: Vec<ModelValue>,
}

impl Counterexample {
    /// The value of the entry with the given name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }
}

impl Display for Counterexample {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for value in &self.values {
            writeln!(f, "  {value}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The asserted value is non zero on the path.
    Verified,
    /// The asserted value can be zero. The counterexample is missing if the solver gave up.
    Violated {
        counterexample: Option<Counterexample>,
    },
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Verdict::Violated { .. })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AssertionCheck {
    pub sink: NodeId,
    pub path: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Everything found for one (source, sink) pair.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SinkReport {
    pub source: NodeId,
    pub sink: NodeId,
    pub paths: BTreeSet<String>,
    pub checks: Vec<AssertionCheck>,
    pub truncated: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AnalysisReport {
    pub sinks: Vec<SinkReport>,
}

impl AnalysisReport {
    /// The union of the paths to all sinks.
    pub fn all_paths(&self) -> BTreeSet<String> {
        self.sinks
            .iter()
            .flat_map(|s| s.paths.iter().cloned())
            .collect()
    }

    pub fn checks(&self) -> impl Iterator<Item = &AssertionCheck> {
        self.sinks.iter().flat_map(|s| s.checks.iter())
    }

    pub fn assertions_checked(&self) -> usize {
        self.checks().count()
    }

    pub fn violations(&self) -> usize {
        self.checks().filter(|c| c.verdict.is_violation()).count()
    }

    /// One line per path and per verdict, in the form the test harness matches against.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for sink in &self.sinks {
            messages.extend(sink.paths.iter().map(|p| format!("path {p}")));
            for check in &sink.checks {
                let message = match &check.verdict {
                    Verdict::Verified => format!("assertion verified at node {}", check.sink),
                    Verdict::Violated { .. } => {
                        format!("assertion violated at node {}", check.sink)
                    }
                };
                messages.push(message);
            }
        }
        messages
    }
}

impl Display for AnalysisReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for sink in &self.sinks {
            writeln!(f, "paths from node {} to node {}:", sink.source, sink.sink)?;
            for path in &sink.paths {
                writeln!(f, "  {path}")?;
            }
            if sink.truncated {
                writeln!(f, "  (exploration was cut short by a limit)")?;
            }
            for check in &sink.checks {
                match &check.verdict {
                    Verdict::Verified => {
                        writeln!(f, "assertion verified at node {} on {}", check.sink, check.path)?
                    }
                    Verdict::Violated { counterexample } => {
                        writeln!(f, "assertion violated at node {} on {}", check.sink, check.path)?;
                        match counterexample {
                            Some(counterexample) => {
                                writeln!(f, "counterexample:")?;
                                write!(f, "{counterexample}")?;
                            }
                            None => writeln!(f, "the solver could not produce a counterexample")?,
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
