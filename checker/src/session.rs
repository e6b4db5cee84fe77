// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::address_space::{AddressSpace, MAX_OBJECT_ID};
use crate::call_context::CallContext;
use crate::error::{EngineError, EngineResult};
use crate::expression::Expression;
use crate::heap::SymbolicHeap;
use crate::program::VarId;
use crate::smt_solver::{SmtResult, SmtSolver};
use crate::symbol_table::SymbolTable;

use log_derive::logfn_inputs;
use mirai_annotations::*;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter, Result};
use std::rc::Rc;

/// A position in the constraint log to which a session can be rewound.
#[derive(Debug)]
pub struct Checkpoint {
    depth: usize,
    log_length: usize,
    memory: Rc<Expression>,
}

/// The mutable state of one (source, sink) analysis: the solver and its constraint log,
/// the symbol table, the address space and the heap.
///
/// Everything that is asserted goes through add_constraint, which records the assertion in
/// the log as well as in the solver. A checkpoint opens a solver scope; rewinding to it closes
/// the scope and truncates the log and the heap to what they were when it was taken.
pub struct AnalysisSession<E> {
    solver: Box<dyn SmtSolver<E>>,
    symbols: SymbolTable,
    addresses: AddressSpace,
    heap: SymbolicHeap,
    objects: BTreeSet<VarId>,
    constraint_log: Vec<Rc<Expression>>,
}

impl<E> Debug for AnalysisSession<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "AnalysisSession(capacity: {}, constraints: {})",
            self.symbols.capacity(),
            self.constraint_log.len()
        )
    }
}

impl<E> AnalysisSession<E> {
    /// Creates a session whose symbol table has room for `capacity` ids.
    pub fn new(solver: Box<dyn SmtSolver<E>>, capacity: u32) -> AnalysisSession<E> {
        let capacity = capacity.min(MAX_OBJECT_ID + 1);
        AnalysisSession {
            solver,
            symbols: SymbolTable::new(capacity),
            addresses: AddressSpace::new(capacity),
            heap: SymbolicHeap::default(),
            objects: BTreeSet::new(),
            constraint_log: Vec::new(),
        }
    }

    pub fn solver(&self) -> &dyn SmtSolver<E> {
        self.solver.as_ref()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn heap(&self) -> &SymbolicHeap {
        &self.heap
    }

    /// The ids of the memory objects whose addresses have been taken, primary and derived.
    pub fn objects(&self) -> &BTreeSet<VarId> {
        &self.objects
    }

    /// The assertions that are currently in force, oldest first.
    pub fn constraint_log(&self) -> &[Rc<Expression>] {
        &self.constraint_log
    }

    /// The expression of value variable `id` in `context`.
    pub fn value(&mut self, id: VarId, context: &CallContext) -> EngineResult<Rc<Expression>> {
        self.symbols.expr_for(id, context)
    }

    pub fn bind(
        &mut self,
        id: VarId,
        context: &CallContext,
        expression: Rc<Expression>,
    ) -> EngineResult<()> {
        self.symbols.bind(id, context, expression)
    }

    /// The address of object `id`, which is recorded as the object's expression.
    pub fn object_address(&mut self, id: VarId) -> EngineResult<Rc<Expression>> {
        let address = Expression::constant(self.addresses.object_address(id)?);
        if self.objects.insert(id) {
            self.symbols
                .bind(id, &CallContext::default(), address.clone())?;
        }
        Ok(address)
    }

    /// The address of the sub-object `offset` flattened fields away from the object `base`
    /// points to. The base is resolved to a concrete address in the current model.
    #[logfn_inputs(TRACE)]
    pub fn field_address(
        &mut self,
        base: &Rc<Expression>,
        offset: i64,
    ) -> EngineResult<Rc<Expression>> {
        let base_address = self.eval(base)?;
        match self.addresses.field_object(base_address, offset)? {
            None => Ok(base.clone()),
            Some((id, address)) => {
                let address = Expression::constant(address);
                if self.objects.insert(id) {
                    self.symbols
                        .bind(id, &CallContext::default(), address.clone())?;
                }
                Ok(address)
            }
        }
    }

    /// Writes `value` to the address that `location` has in the current model.
    #[logfn_inputs(TRACE)]
    pub fn store(&mut self, location: &Rc<Expression>, value: Rc<Expression>) -> EngineResult<()> {
        let address = self.eval(location)?;
        self.heap.store(address, value)
    }

    /// Reads the value at the address that `location` has in the current model.
    #[logfn_inputs(TRACE)]
    pub fn load(&mut self, location: &Rc<Expression>) -> EngineResult<Rc<Expression>> {
        let address = self.eval(location)?;
        self.heap.load(address)
    }

    /// Evaluates `expression` in a model of the current constraints. A constraint log without
    /// a model means that contradictory constraints were asserted, which is fatal.
    #[logfn_inputs(TRACE)]
    pub fn eval(&self, expression: &Rc<Expression>) -> EngineResult<i64> {
        match self.solver.solve() {
            SmtResult::Unsatisfiable => Err(EngineError::ContradictoryConstraints),
            SmtResult::Undefined => Err(EngineError::SolverUnknown),
            SmtResult::Satisfiable => self
                .solver
                .evaluate(expression)
                .ok_or_else(|| EngineError::NotNumeral(format!("{expression:?}"))),
        }
    }

    /// Asserts `constraint` in the current scope.
    #[logfn_inputs(TRACE)]
    pub fn add_constraint(&mut self, constraint: Rc<Expression>) {
        let predicate = self.solver.get_as_smt_predicate(&constraint);
        self.solver.assert(&predicate);
        self.constraint_log.push(constraint);
    }

    /// Decides whether `condition` is consistent with the current constraints without
    /// asserting it.
    #[logfn_inputs(TRACE)]
    pub fn is_feasible(&self, condition: &Rc<Expression>) -> SmtResult {
        let predicate = self.solver.get_as_smt_predicate(condition);
        self.solver.solve_expression(&predicate)
    }

    /// Opens a solver scope.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.solver.set_backtrack_position();
        Checkpoint {
            depth: self.solver.backtrack_depth(),
            log_length: self.constraint_log.len(),
            memory: self.heap.memory().clone(),
        }
    }

    /// Closes the scope opened by `checkpoint`, which must be the innermost open scope.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        checked_assume!(
            self.solver.backtrack_depth() == checkpoint.depth,
            "solver scopes must be closed in the order they were opened"
        );
        self.solver.backtrack();
        self.constraint_log.truncate(checkpoint.log_length);
        self.heap.restore(checkpoint.memory);
    }

    /// Clears all state so that the session can analyze another (source, sink) pair.
    pub fn reset(&mut self) {
        self.solver.reset();
        self.symbols.clear();
        self.addresses.clear();
        self.heap.reset();
        self.objects.clear();
        self.constraint_log.clear();
    }
}
