// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::expression::Expression;

use mirai_annotations::precondition;
use serde::{Deserialize, Serialize};

/// The result of using the solver to solve an expression.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SmtResult {
    /// There is an assignment of values to the free variables for which the expression is true.
    Satisfiable,
    /// There is a proof that no assignment of values to the free variables can make the expression true.
    Unsatisfiable,
    /// The solver timed out while trying to solve this expression.
    Undefined,
}

/// The functionality that a solver must expose in order for the engine to use it.
///
/// The solver keeps a stack of nested contexts. Every call to set_backtrack_position must be
/// matched by exactly one call to backtrack at the same depth of the path traversal.
pub trait SmtSolver<SmtExpressionType> {
    /// Adds the given expression to the current context.
    fn assert(&self, expression: &SmtExpressionType);

    /// Destroy the current context and restore the containing context as current.
    fn backtrack(&self) {
        precondition!(self.backtrack_depth() > 0);
    }

    /// The number of nested contexts that are currently open.
    fn backtrack_depth(&self) -> usize;

    /// Returns the value of the given integer expression in the model found by the last call to
    /// solve. Unconstrained sub-terms are completed with default values.
    /// Can only be called after self.solve returned SmtResult::Satisfiable.
    fn evaluate(&self, expression: &Expression) -> Option<i64>;

    /// Translate the engine expression into a corresponding predicate for the Solver.
    fn get_as_smt_predicate(&self, expression: &Expression) -> SmtExpressionType;

    /// Provides a string that contains a set of variable assignments that satisfied the
    /// assertions in the solver. Can only be called after self.solve return SmtResult::Satisfiable.
    fn get_model_as_string(&self) -> String;

    /// Returns an expression that is the logical inverse of the given expression.
    fn invert_predicate(&self, expression: &SmtExpressionType) -> SmtExpressionType;

    /// Removes all assertions and closes every nested context.
    fn reset(&self);

    /// Create a nested context. When a matching backtrack is called, the current context (state)
    /// of the solver will be restored to what it was when this was called.
    fn set_backtrack_position(&self);

    /// Try to find an assignment of values to the free variables so that the assertions in the
    /// current context are all true.
    fn solve(&self) -> SmtResult;

    /// Establish if the given expression can be satisfied (or not) without changing the current context.
    fn solve_expression(&self, expression: &SmtExpressionType) -> SmtResult {
        self.set_backtrack_position();
        self.assert(expression);
        let result = self.solve();
        self.backtrack();
        result
    }
}
