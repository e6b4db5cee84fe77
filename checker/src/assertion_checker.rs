// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::address_space::address_of;
use crate::call_context::CallContext;
use crate::error::EngineResult;
use crate::expression::{Expression, ExpressionTrait};
use crate::program::IcfgNode;
use crate::report::{Counterexample, ModelValue, Verdict};
use crate::session::AnalysisSession;
use crate::smt_solver::SmtResult;
use crate::symbol_table::value_name;
use crate::translator::InstructionTranslator;

use log_derive::logfn_inputs;
use std::collections::HashSet;

/// Decides the assertion made by a sink call.
#[derive(Clone, Copy, Debug)]
pub struct AssertionChecker<'program> {
    translator: InstructionTranslator<'program>,
}

impl<'program> AssertionChecker<'program> {
    pub fn new(translator: InstructionTranslator<'program>) -> AssertionChecker<'program> {
        AssertionChecker { translator }
    }

    /// Checks whether the first argument of the call at `sink` can be zero given the
    /// constraints of the current path. Returns None for sinks without arguments, which are
    /// only reachability targets. The session is left exactly as it was found.
    #[logfn_inputs(TRACE)]
    pub fn check<E>(
        &self,
        session: &mut AnalysisSession<E>,
        sink: &IcfgNode,
        context: &CallContext,
    ) -> EngineResult<Option<Verdict>> {
        let Some(argument) = sink.call.as_ref().and_then(|c| c.arguments.first()) else {
            return Ok(None);
        };
        let value = self.translator.value_of(session, *argument, context)?;
        let checkpoint = session.checkpoint();
        session.add_constraint(value.equals(Expression::constant(0)));
        let verdict = match session.solver().solve() {
            SmtResult::Unsatisfiable => Verdict::Verified,
            SmtResult::Satisfiable => {
                debug!("model:\n{}", session.solver().get_model_as_string());
                Verdict::Violated {
                    counterexample: Some(counterexample(session)),
                }
            }
            SmtResult::Undefined => Verdict::Violated {
                counterexample: None,
            },
        };
        session.rewind(checkpoint);
        Ok(Some(verdict))
    }
}

/// Reads the values of the symbols and the contents of the objects that the current path
/// mentions from the model found by the last satisfiability check. Symbols bound on other
/// paths stay in the symbol table but are left out.
fn counterexample<E>(session: &AnalysisSession<E>) -> Counterexample {
    let mut names = HashSet::new();
    let mut literals = HashSet::new();
    for constraint in session.constraint_log() {
        constraint.collect_leaves(&mut names, &mut literals);
    }
    session
        .heap()
        .memory()
        .collect_leaves(&mut names, &mut literals);
    let mentioned = |expression: &Expression| {
        let mut leaf_names = HashSet::new();
        let mut leaf_literals = HashSet::new();
        expression.collect_leaves(&mut leaf_names, &mut leaf_literals);
        leaf_names.iter().any(|n| names.contains(n))
            || leaf_literals.iter().any(|l| literals.contains(l))
    };

    let solver = session.solver();
    let mut values = Vec::new();
    for (id, context, expression) in session.symbols().bindings() {
        if session.objects().contains(&id) || !mentioned(expression.as_ref()) {
            continue;
        }
        if let Some(value) = solver.evaluate(&expression) {
            values.push(ModelValue {
                name: value_name(id, &context).trim_end().to_string(),
                value,
            });
        }
    }
    for id in session.objects() {
        let address = address_of(*id);
        if !literals.contains(&address) {
            continue;
        }
        let content = session.heap().memory().select(Expression::constant(address));
        if let Some(value) = solver.evaluate(&content) {
            values.push(ModelValue {
                name: format!("ObjVar{id} ({address:#x})"),
                value,
            });
        }
    }
    Counterexample { values }
}
