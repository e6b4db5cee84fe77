// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::call_context::CallContext;
use crate::error::{EngineError, EngineResult};
use crate::expression::{Expression, ExpressionTrait};
use crate::program::{
    BinaryOperator, BranchCondition, ControlFlowEdge, EdgeKind, FieldOffset, IcfgNode,
    IndexScale, Instruction, NodeId, OffsetIndex, PhiIncoming, Predicate, Program, VarId,
    VariableKind,
};
use crate::session::AnalysisSession;
use crate::smt_solver::SmtResult;

use log_derive::logfn_inputs;
use std::rc::Rc;

/// Turns the instructions of the nodes along a path into constraints over the session.
#[derive(Clone, Copy, Debug)]
pub struct InstructionTranslator<'program> {
    program: &'program Program,
}

impl<'program> InstructionTranslator<'program> {
    pub fn new(program: &'program Program) -> InstructionTranslator<'program> {
        InstructionTranslator { program }
    }

    /// Globals live outside of every calling context.
    fn context_for(&self, id: VarId, context: &CallContext) -> CallContext {
        match self.program.variable(id) {
            Some(variable) if variable.function.is_none() => CallContext::default(),
            _ => context.clone(),
        }
    }

    /// The symbolic value of variable `id` when referenced in `context`.
    pub fn value_of<E>(
        &self,
        session: &mut AnalysisSession<E>,
        id: VarId,
        context: &CallContext,
    ) -> EngineResult<Rc<Expression>> {
        match self.program.variable(id).map(|v| &v.kind) {
            Some(VariableKind::ConstantValue(v)) | Some(VariableKind::ConstantObject(v)) => {
                Ok(Expression::constant(*v))
            }
            Some(VariableKind::Object) => session.object_address(id),
            Some(VariableKind::Value) | None => {
                let context = self.context_for(id, context);
                session.value(id, &context)
            }
        }
    }

    /// Applies the effect of traversing `edge`: decides its branch condition, binds
    /// parameters or return values, and translates the instructions of its destination.
    /// `before` is the calling context at the source of the edge and `after` the one at
    /// its destination. Returns false if the edge cannot be taken.
    #[logfn_inputs(TRACE)]
    pub fn translate_edge<E>(
        &self,
        session: &mut AnalysisSession<E>,
        edge: &ControlFlowEdge<'_>,
        before: &CallContext,
        after: &CallContext,
    ) -> EngineResult<bool> {
        match edge.kind {
            EdgeKind::Intra {
                condition: Some(condition),
            } => {
                if !self.branch_is_feasible(session, condition, before)? {
                    debug!("pruned infeasible edge {:?} -> {}", edge.src, edge.dst);
                    return Ok(false);
                }
            }
            EdgeKind::Intra { condition: None } => {}
            EdgeKind::Call { parameters } => {
                for parameter in parameters {
                    let actual = self.value_of(session, parameter.actual, before)?;
                    let formal = self.value_of(session, parameter.formal, after)?;
                    session.add_constraint(formal.equals(actual));
                }
            }
            EdgeKind::Return { call_site, result } => {
                if before.top() != Some(*call_site) {
                    return Err(EngineError::UnbalancedCallStack {
                        call_site: *call_site,
                        context: before.to_string(),
                    });
                }
                if let Some(binding) = result {
                    let value = self.value_of(session, binding.value, before)?;
                    let receiver = self.value_of(session, binding.receiver, after)?;
                    session.add_constraint(receiver.equals(value));
                }
            }
        }
        let node = self.program.node(edge.dst)?;
        for instruction in &node.instructions {
            self.translate_instruction(session, instruction, node, edge.src, after)?;
        }
        Ok(true)
    }

    /// Tentatively asserts the branch condition in a nested scope. A feasible condition is
    /// then asserted for real, so that it constrains everything after the branch.
    fn branch_is_feasible<E>(
        &self,
        session: &mut AnalysisSession<E>,
        condition: &BranchCondition,
        context: &CallContext,
    ) -> EngineResult<bool> {
        let value = self.value_of(session, condition.variable, context)?;
        let guard = value.equals(Expression::constant(condition.successor_value));
        match session.is_feasible(&guard) {
            SmtResult::Unsatisfiable => Ok(false),
            SmtResult::Satisfiable => {
                debug!("branch condition {guard:?} is feasible");
                session.add_constraint(guard);
                Ok(true)
            }
            SmtResult::Undefined => {
                warn!("solver gave up on branch condition {guard:?}, assuming it is feasible");
                session.add_constraint(guard);
                Ok(true)
            }
        }
    }

    #[logfn_inputs(TRACE)]
    fn translate_instruction<E>(
        &self,
        session: &mut AnalysisSession<E>,
        instruction: &Instruction,
        node: &IcfgNode,
        predecessor: Option<NodeId>,
        context: &CallContext,
    ) -> EngineResult<()> {
        match instruction {
            Instruction::AddressOf { result, object } => {
                if !self
                    .program
                    .variable(*object)
                    .map_or(false, |v| v.is_object())
                {
                    return Err(EngineError::UnknownVariable(*object));
                }
                let address = self.value_of(session, *object, context)?;
                let result_context = self.context_for(*result, context);
                session.bind(*result, &result_context, address)?;
            }
            Instruction::Copy { result, source } => {
                let source = self.value_of(session, *source, context)?;
                self.assign(session, *result, context, source)?;
            }
            Instruction::Load { result, pointer } => {
                let location = self.value_of(session, *pointer, context)?;
                let value = session.load(&location)?;
                self.assign(session, *result, context, value)?;
            }
            Instruction::Store { pointer, value } => {
                let location = self.value_of(session, *pointer, context)?;
                let value = self.value_of(session, *value, context)?;
                session.store(&location, value)?;
            }
            Instruction::FieldOffset {
                result,
                base,
                offset,
            } => {
                let offset = self.field_offset(session, offset, context)?;
                let base = self.value_of(session, *base, context)?;
                let address = session.field_address(&base, offset)?;
                self.assign(session, *result, context, address)?;
            }
            Instruction::Compare {
                result,
                left,
                right,
                predicate,
            } => {
                let left = self.value_of(session, *left, context)?;
                let right = self.value_of(session, *right, context)?;
                let holds = match predicate {
                    Predicate::Eq => left.equals(right),
                    Predicate::Ne => left.not_equals(right),
                    Predicate::Ugt | Predicate::Sgt => left.greater_than(right),
                    Predicate::Uge | Predicate::Sge => left.greater_or_equal(right),
                    Predicate::Ult | Predicate::Slt => left.less_than(right),
                    Predicate::Ule | Predicate::Sle => left.less_or_equal(right),
                };
                let value =
                    holds.conditional_expression(Expression::constant(1), Expression::constant(0));
                self.assign(session, *result, context, value)?;
            }
            Instruction::Binary {
                result,
                left,
                right,
                operator,
            } => {
                let left = self.value_of(session, *left, context)?;
                let right = self.value_of(session, *right, context)?;
                let value = match operator {
                    BinaryOperator::Add => left.add(right),
                    BinaryOperator::Sub => left.sub(right),
                    BinaryOperator::Mul => left.mul(right),
                    BinaryOperator::SDiv => left.div(right),
                    BinaryOperator::SRem => left.rem(right),
                    BinaryOperator::Xor => left.bit_xor(right),
                    BinaryOperator::And => left.bit_and(right),
                    BinaryOperator::Or => left.bit_or(right),
                    BinaryOperator::AShr => left.shr(right),
                    BinaryOperator::Shl => left.shl(right),
                };
                self.assign(session, *result, context, value)?;
            }
            Instruction::Branch { condition } => {
                debug!(
                    "branch on {condition} at node {} is decided by its outgoing edges",
                    node.id
                );
            }
            Instruction::Phi { result, incoming } => {
                let chosen = self.phi_operand(node, incoming, predecessor)?;
                let value = self.value_of(session, chosen, context)?;
                self.assign(session, *result, context, value)?;
            }
            Instruction::Select {
                result,
                condition,
                true_value,
                false_value,
            } => {
                let condition = self.value_of(session, *condition, context)?;
                let true_value = self.value_of(session, *true_value, context)?;
                let false_value = self.value_of(session, *false_value, context)?;
                let value = condition
                    .equals(Expression::constant(1))
                    .conditional_expression(true_value, false_value);
                self.assign(session, *result, context, value)?;
            }
        }
        Ok(())
    }

    /// Asserts that variable `result` equals `value`.
    fn assign<E>(
        &self,
        session: &mut AnalysisSession<E>,
        result: VarId,
        context: &CallContext,
        value: Rc<Expression>,
    ) -> EngineResult<()> {
        let target = self.value_of(session, result, context)?;
        debug!("{target:?} == {value:?}");
        session.add_constraint(target.equals(value));
        Ok(())
    }

    /// Picks the incoming value of a phi that flows along the edge from `predecessor`.
    /// A value defined at the predecessor itself wins. Otherwise the first value qualifies
    /// whose defining block is post-dominated by the block of the predecessor, that is, the
    /// value whose definition every path reaches the predecessor from.
    fn phi_operand(
        &self,
        node: &IcfgNode,
        incoming: &[PhiIncoming],
        predecessor: Option<NodeId>,
    ) -> EngineResult<VarId> {
        let not_found = |predecessor: NodeId| EngineError::PhiPredecessorNotFound {
            node: node.id,
            predecessor,
        };
        let predecessor = predecessor.ok_or_else(|| not_found(node.id))?;
        if let Some(operand) = incoming.iter().find(|i| i.node == predecessor) {
            return Ok(operand.value);
        }
        incoming
            .iter()
            .find(|i| self.program.post_dominates(predecessor, i.node))
            .map(|i| i.value)
            .ok_or_else(|| not_found(predecessor))
    }

    /// Computes a flattened field offset. Symbolic indices are resolved in the current model.
    fn field_offset<E>(
        &self,
        session: &mut AnalysisSession<E>,
        offset: &FieldOffset,
        context: &CallContext,
    ) -> EngineResult<i64> {
        let terms = match offset {
            FieldOffset::Constant(offset) => return Ok(*offset),
            FieldOffset::Indexed(terms) => terms,
        };
        let mut total: i64 = 0;
        for term in terms.iter().rev() {
            let index = match term.index {
                OffsetIndex::Constant(index) => index,
                OffsetIndex::Variable(id) => {
                    let value = self.value_of(session, id, context)?;
                    session.eval(&value)?
                }
            };
            let scaled = match &term.scale {
                IndexScale::None => Some(index),
                IndexScale::Pointer { element_count } => index.checked_mul(*element_count),
                IndexScale::Aggregate { flattened_indices } => usize::try_from(index)
                    .ok()
                    .and_then(|i| flattened_indices.get(i))
                    .copied(),
            };
            total = scaled
                .and_then(|s| total.checked_add(s))
                .ok_or_else(|| {
                    EngineError::InvalidFieldOffset(format!(
                        "index {index} is outside of the layout {:?}",
                        term.scale
                    ))
                })?;
        }
        Ok(total)
    }
}
