// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::program::{NodeId, VarId};

use thiserror::Error;

/// Conditions that terminate an analysis run.
///
/// Infeasible branches and unrealizable returns are not errors. The explorer prunes
/// them locally, and they never show up here. Assertion violations are not errors either;
/// they are the product of the analysis and are carried by the report.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A variable or derived object id does not fit in the symbol table.
    #[error("variable id {id} exceeds the symbol table capacity of {capacity} (see --max_symbols)")]
    Capacity { id: u64, capacity: u32 },

    #[error("pointer operand is not a physical address: {value}")]
    InvalidOperand { value: i64 },

    #[error("unsatisfied constraints: contradictory constraints were added to the solver")]
    ContradictoryConstraints,

    #[error("the solver could not decide the current constraints")]
    SolverUnknown,

    #[error("expression {0} does not evaluate to an integer numeral")]
    NotNumeral(String),

    #[error("no incoming value of the phi at node {node} post-dominates predecessor {predecessor}")]
    PhiPredecessorNotFound { node: NodeId, predecessor: NodeId },

    #[error("return to call site {call_site} does not match the calling context {context}")]
    UnbalancedCallStack { call_site: NodeId, context: String },

    #[error("invalid field offset: {0}")]
    InvalidFieldOffset(String),

    #[error("unknown ICFG node {0}")]
    UnknownNode(NodeId),

    #[error("unknown variable {0}")]
    UnknownVariable(VarId),

    #[error("node {0} is defined more than once")]
    DuplicateNode(NodeId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed program description: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
