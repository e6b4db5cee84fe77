// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::assertion_checker::AssertionChecker;
use crate::call_context::CallContext;
use crate::error::{EngineError, EngineResult};
use crate::explorer::{IcfgPath, PathVisitor};
use crate::program::{ControlFlowEdge, NodeId, Program};
use crate::report::{AssertionCheck, SinkReport};
use crate::session::{AnalysisSession, Checkpoint};
use crate::translator::InstructionTranslator;

use mirai_annotations::*;
use std::ops::ControlFlow;

/// A path visitor that translates every edge as it is entered, so that infeasible edges are
/// pruned as soon as they are reached, and that checks the assertion at the end of each path.
///
/// An edge that cannot be translated only matters if the sink is reachable through it. The
/// error is held until the first path below the edge reaches the sink, and the edges in
/// between are followed without being translated.
pub struct SymbolicExecutor<'session, 'program, E> {
    program: &'program Program,
    session: &'session mut AnalysisSession<E>,
    translator: InstructionTranslator<'program>,
    checker: AssertionChecker<'program>,
    /// One entry per entered edge. None for edges that were not translated.
    checkpoints: Vec<Option<Checkpoint>>,
    /// The translation error of the entered edge at the given depth of checkpoints.
    deferred: Option<(usize, EngineError)>,
    stop_on_violation: bool,
    report: SinkReport,
}

impl<'session, 'program, E> SymbolicExecutor<'session, 'program, E> {
    pub fn new(
        program: &'program Program,
        session: &'session mut AnalysisSession<E>,
        source: NodeId,
        sink: NodeId,
        stop_on_violation: bool,
    ) -> SymbolicExecutor<'session, 'program, E> {
        let translator = InstructionTranslator::new(program);
        SymbolicExecutor {
            program,
            session,
            translator,
            checker: AssertionChecker::new(translator),
            checkpoints: Vec::new(),
            deferred: None,
            stop_on_violation,
            report: SinkReport {
                source,
                sink,
                ..SinkReport::default()
            },
        }
    }

    /// The paths and verdicts collected so far.
    pub fn into_report(self) -> SinkReport {
        precondition!(self.checkpoints.is_empty());
        self.report
    }

    /// The session the executor works on.
    pub fn session(&self) -> &AnalysisSession<E> {
        self.session
    }
}

impl<E> PathVisitor for SymbolicExecutor<'_, '_, E> {
    fn enter_edge(
        &mut self,
        edge: &ControlFlowEdge<'_>,
        before: &CallContext,
        after: &CallContext,
    ) -> EngineResult<bool> {
        if self.deferred.is_some() {
            self.checkpoints.push(None);
            return Ok(true);
        }
        let checkpoint = self.session.checkpoint();
        match self
            .translator
            .translate_edge(self.session, edge, before, after)
        {
            Ok(feasible) => {
                self.checkpoints.push(Some(checkpoint));
                Ok(feasible)
            }
            Err(e) => {
                self.session.rewind(checkpoint);
                debug!("edge {:?} -> {} failed: {e}", edge.src, edge.dst);
                self.deferred = Some((self.checkpoints.len(), e));
                self.checkpoints.push(None);
                Ok(true)
            }
        }
    }

    fn leave_edge(&mut self, _edge: &ControlFlowEdge<'_>) {
        match self.checkpoints.pop() {
            Some(Some(checkpoint)) => self.session.rewind(checkpoint),
            Some(None) => {
                if matches!(self.deferred, Some((depth, _)) if depth == self.checkpoints.len()) {
                    self.deferred = None;
                }
            }
            None => assume_unreachable!("an edge was left without being entered"),
        }
    }

    fn visit_path(
        &mut self,
        path: &IcfgPath<'_>,
        context: &CallContext,
    ) -> EngineResult<ControlFlow<()>> {
        if let Some((_, e)) = self.deferred.take() {
            return Err(e);
        }
        let rendered = path.to_string();
        self.report.paths.insert(rendered.clone());
        let sink = self.program.node(self.report.sink)?;
        let Some(verdict) = self.checker.check(self.session, sink, context)? else {
            return Ok(ControlFlow::Continue(()));
        };
        let violated = verdict.is_violation();
        if violated {
            info!("assertion at node {} can fail on {rendered}", sink.id);
        } else {
            info!("assertion at node {} holds on {rendered}", sink.id);
        }
        self.report.checks.push(AssertionCheck {
            sink: sink.id,
            path: rendered,
            verdict,
        });
        if violated && self.stop_on_violation {
            Ok(ControlFlow::Break(()))
        } else {
            Ok(ControlFlow::Continue(()))
        }
    }
}
