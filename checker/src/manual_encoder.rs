// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Hand encoding of small programs. Variables are named by strings instead of ids, which
//! makes it convenient to state the constraints of a program by hand and to query the model.

use crate::call_context::CallContext;
use crate::error::EngineResult;
use crate::expression::{Expression, ExpressionTrait};
use crate::program::VarId;
use crate::session::AnalysisSession;
use crate::smt_solver::{SmtResult, SmtSolver};

use std::collections::HashMap;
use std::rc::Rc;

pub struct ManualEncoder<E> {
    session: AnalysisSession<E>,
    ids: HashMap<String, VarId>,
}

impl<E> ManualEncoder<E> {
    pub fn new(solver: Box<dyn SmtSolver<E>>, capacity: u32) -> ManualEncoder<E> {
        ManualEncoder {
            session: AnalysisSession::new(solver, capacity),
            ids: HashMap::new(),
        }
    }

    pub fn session(&mut self) -> &mut AnalysisSession<E> {
        &mut self.session
    }

    /// Names get ids in the order in which they are first used, starting at 1.
    fn id_of(&mut self, name: &str) -> VarId {
        let next = self.ids.len() as VarId + 1;
        *self.ids.entry(name.to_string()).or_insert(next)
    }

    pub fn has(&self, name: &str) -> bool {
        self.ids
            .get(name)
            .map_or(false, |id| self.session.symbols().has(*id, &CallContext::default()))
    }

    /// The integer named `name`, created unconstrained on first use.
    pub fn value(&mut self, name: &str) -> EngineResult<Rc<Expression>> {
        let id = self.id_of(name);
        let root = CallContext::default();
        if !self.session.symbols().has(id, &root) {
            self.session.bind(id, &root, Expression::variable(name))?;
        }
        self.session.value(id, &root)
    }

    /// The address of the memory object named `name`, as returned by an allocation.
    pub fn object_address(&mut self, name: &str) -> EngineResult<Rc<Expression>> {
        let id = self.id_of(name);
        self.session.object_address(id)
    }

    pub fn field_address(
        &mut self,
        pointer: &Rc<Expression>,
        offset: i64,
    ) -> EngineResult<Rc<Expression>> {
        self.session.field_address(pointer, offset)
    }

    /// Asserts `name == value`.
    pub fn assign(&mut self, name: &str, value: Rc<Expression>) -> EngineResult<()> {
        let variable = self.value(name)?;
        self.session.add_constraint(variable.equals(value));
        Ok(())
    }

    pub fn add_constraint(&mut self, constraint: Rc<Expression>) {
        self.session.add_constraint(constraint);
    }

    pub fn store(&mut self, pointer: &Rc<Expression>, value: Rc<Expression>) -> EngineResult<()> {
        self.session.store(pointer, value)
    }

    pub fn load(&mut self, pointer: &Rc<Expression>) -> EngineResult<Rc<Expression>> {
        self.session.load(pointer)
    }

    /// The value of `name` in a model of the constraints added so far.
    pub fn evaluate(&mut self, name: &str) -> EngineResult<i64> {
        let variable = self.value(name)?;
        self.session.eval(&variable)
    }

    pub fn eval(&self, expression: &Rc<Expression>) -> EngineResult<i64> {
        self.session.eval(expression)
    }

    /// True if `predicate` holds in every model, that is, if its negation is unsatisfiable.
    /// The constraints are left unchanged.
    pub fn check_negated(&self, predicate: &Rc<Expression>) -> bool {
        let solver = self.session.solver();
        let negation = solver.invert_predicate(&solver.get_as_smt_predicate(predicate));
        solver.solve_expression(&negation) == SmtResult::Unsatisfiable
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.ids.clear();
    }
}
