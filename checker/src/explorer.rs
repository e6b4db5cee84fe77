// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::call_context::CallContext;
use crate::error::EngineResult;
use crate::k_limits;
use crate::program::{ControlFlowEdge, EdgeKind, NodeId, Program};

use itertools::Itertools;
use petgraph::graph::EdgeIndex;
use std::collections::{BTreeSet, HashSet};
use std::fmt::{Display, Formatter, Result};
use std::ops::ControlFlow;

/// Bounds on the exploration.
#[derive(Clone, Copy, Debug)]
pub struct ExplorerConfig {
    pub max_paths: usize,
    pub max_path_length: usize,
    pub max_call_depth: usize,
    /// Also accept sinks that are reached inside a callee.
    pub nested_sinks: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            max_paths: k_limits::MAX_PATHS_DEFAULT,
            max_path_length: k_limits::MAX_PATH_LENGTH_DEFAULT,
            max_call_depth: k_limits::MAX_CALL_DEPTH_DEFAULT,
            nested_sinks: false,
        }
    }
}

/// The edges from the synthetic start edge to the edge entering a sink.
#[derive(Clone, Debug, Default)]
pub struct IcfgPath<'program> {
    edges: Vec<ControlFlowEdge<'program>>,
}

impl<'program> IcfgPath<'program> {
    pub fn edges(&self) -> &[ControlFlowEdge<'program>] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Renders as `START: n1->n2->...->nk->END`.
impl Display for IcfgPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "START: {}->END",
            self.edges.iter().map(|e| e.dst).join("->")
        )
    }
}

/// Callbacks of the explorer.
///
/// leave_edge is called exactly once for every call of enter_edge that returned Ok, after
/// the subtree below the edge has been explored, pruned or abandoned because of an error.
pub trait PathVisitor {
    /// Takes `edge` from calling context `before` into calling context `after`.
    /// Returning false prunes the edge and everything below it.
    fn enter_edge(
        &mut self,
        edge: &ControlFlowEdge<'_>,
        before: &CallContext,
        after: &CallContext,
    ) -> EngineResult<bool>;

    /// Undoes everything done by the matching enter_edge.
    fn leave_edge(&mut self, edge: &ControlFlowEdge<'_>);

    /// Called for every path that reaches the sink. Break stops the whole exploration.
    fn visit_path(
        &mut self,
        path: &IcfgPath<'_>,
        context: &CallContext,
    ) -> EngineResult<ControlFlow<()>>;
}

/// Summary of one exploration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExplorationOutcome {
    pub paths_found: usize,
    /// Some paths were not explored because of a limit.
    pub truncated: bool,
    /// A visitor stopped the exploration.
    pub halted: bool,
}

/// Depth first enumeration of the paths from a source node to a sink node.
///
/// Each path traverses an edge at most once per calling context, so a loop body is entered
/// once per path. A return edge is only followed back to the call site on top of the
/// calling context, which keeps every path interprocedurally realizable.
pub struct PathExplorer<'program> {
    program: &'program Program,
    config: ExplorerConfig,
    sink: NodeId,
    path: IcfgPath<'program>,
    visited: HashSet<(Option<EdgeIndex>, CallContext)>,
    outcome: ExplorationOutcome,
}

impl<'program> PathExplorer<'program> {
    pub fn new(program: &'program Program, config: ExplorerConfig) -> PathExplorer<'program> {
        PathExplorer {
            program,
            config,
            sink: program.entry(),
            path: IcfgPath::default(),
            visited: HashSet::new(),
            outcome: ExplorationOutcome::default(),
        }
    }

    /// Walks every path from `source` to `sink`, reporting them to `visitor`.
    pub fn explore(
        &mut self,
        source: NodeId,
        sink: NodeId,
        visitor: &mut dyn PathVisitor,
    ) -> EngineResult<ExplorationOutcome> {
        self.sink = sink;
        self.path = IcfgPath::default();
        self.visited.clear();
        self.outcome = ExplorationOutcome::default();
        self.traverse(
            ControlFlowEdge::start(source),
            &CallContext::default(),
            visitor,
        )?;
        Ok(self.outcome)
    }

    fn traverse(
        &mut self,
        edge: ControlFlowEdge<'program>,
        context: &CallContext,
        visitor: &mut dyn PathVisitor,
    ) -> EngineResult<ControlFlow<()>> {
        let key = (edge.index, context.clone());
        if self.visited.contains(&key) {
            return Ok(ControlFlow::Continue(()));
        }
        let next_context = match (edge.kind, edge.src) {
            (EdgeKind::Call { .. }, Some(call_site)) => context.push(call_site),
            (EdgeKind::Return { call_site, .. }, _) => match context.pop() {
                Some(caller) if context.top() == Some(*call_site) => caller,
                _ => {
                    debug!("return to {call_site} is not realizable in {context}");
                    return Ok(ControlFlow::Continue(()));
                }
            },
            _ => context.clone(),
        };
        if next_context.depth() > self.config.max_call_depth {
            if !self.outcome.truncated {
                warn!(
                    "calls nested deeper than {} are not followed on the paths to {}",
                    self.config.max_call_depth, self.sink
                );
            }
            self.outcome.truncated = true;
            return Ok(ControlFlow::Continue(()));
        }
        if self.path.len() >= self.config.max_path_length {
            if !self.outcome.truncated {
                warn!(
                    "paths to {} are longer than {} edges, the longer ones are not explored",
                    self.sink, self.config.max_path_length
                );
            }
            self.outcome.truncated = true;
            return Ok(ControlFlow::Continue(()));
        }
        if !visitor.enter_edge(&edge, context, &next_context)? {
            visitor.leave_edge(&edge);
            return Ok(ControlFlow::Continue(()));
        }
        self.visited.insert(key.clone());
        self.path.edges.push(edge);
        let result = self.visit_successors(edge.dst, &next_context, visitor);
        self.path.edges.pop();
        self.visited.remove(&key);
        visitor.leave_edge(&edge);
        result
    }

    fn visit_successors(
        &mut self,
        node: NodeId,
        context: &CallContext,
        visitor: &mut dyn PathVisitor,
    ) -> EngineResult<ControlFlow<()>> {
        if node == self.sink && (context.is_empty() || self.config.nested_sinks) {
            self.outcome.paths_found += 1;
            debug!("found path {}", self.path);
            let flow = visitor.visit_path(&self.path, context)?;
            if flow.is_break() {
                self.outcome.halted = true;
            } else if self.outcome.paths_found >= self.config.max_paths {
                warn!(
                    "stopped after {} paths to {}",
                    self.outcome.paths_found, self.sink
                );
                self.outcome.truncated = true;
                return Ok(ControlFlow::Break(()));
            }
            return Ok(flow);
        }
        let program = self.program;
        for edge in program.outgoing_edges(node)? {
            if self.traverse(edge, context, visitor)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// A visitor that only records the paths, without any symbolic reasoning.
#[derive(Debug, Default)]
pub struct PathCollector {
    pub paths: BTreeSet<String>,
}

impl PathVisitor for PathCollector {
    fn enter_edge(
        &mut self,
        _edge: &ControlFlowEdge<'_>,
        _before: &CallContext,
        _after: &CallContext,
    ) -> EngineResult<bool> {
        Ok(true)
    }

    fn leave_edge(&mut self, _edge: &ControlFlowEdge<'_>) {}

    fn visit_path(
        &mut self,
        path: &IcfgPath<'_>,
        _context: &CallContext,
    ) -> EngineResult<ControlFlow<()>> {
        self.paths.insert(path.to_string());
        Ok(ControlFlow::Continue(()))
    }
}
