// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::call_context::CallContext;
use crate::error::{EngineError, EngineResult};
use crate::expression::Expression;
use crate::program::VarId;

use log_derive::logfn_inputs;
use std::collections::HashMap;
use std::rc::Rc;

/// The name of the solver constant that stands for value variable `id` in `context`.
/// Values in the outermost context keep their plain name.
pub fn value_name(id: VarId, context: &CallContext) -> String {
    if context.is_empty() {
        format!("ValVar{id}")
    } else {
        format!("ValVar{id} {context} ")
    }
}

/// Maps variable ids to their current symbolic expression.
///
/// Ids index a table whose capacity is fixed when the table is created. An id beyond the
/// capacity is a configuration error, not a reason to grow. Values inside a calling context
/// get a slot per context, so a callee analyzed under two call sites sees two distinct symbols.
#[derive(Debug)]
pub struct SymbolTable {
    capacity: u32,
    slots: Vec<Option<Rc<Expression>>>,
    contextual: HashMap<(VarId, CallContext), Rc<Expression>>,
}

impl SymbolTable {
    pub fn new(capacity: u32) -> SymbolTable {
        SymbolTable {
            capacity,
            slots: vec![None; capacity as usize],
            contextual: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn check_bounds(&self, id: VarId) -> EngineResult<usize> {
        if id >= self.capacity {
            return Err(EngineError::Capacity {
                id: u64::from(id),
                capacity: self.capacity,
            });
        }
        Ok(id as usize)
    }

    /// True if `id` already has an expression in `context`.
    pub fn has(&self, id: VarId, context: &CallContext) -> bool {
        if context.is_empty() {
            self.slots
                .get(id as usize)
                .map_or(false, |slot| slot.is_some())
        } else {
            self.contextual.contains_key(&(id, context.clone()))
        }
    }

    /// Returns the expression of `id` in `context`, creating a fresh unconstrained
    /// integer the first time the id is referenced.
    #[logfn_inputs(TRACE)]
    pub fn expr_for(&mut self, id: VarId, context: &CallContext) -> EngineResult<Rc<Expression>> {
        let slot = self.check_bounds(id)?;
        if context.is_empty() {
            Ok(self.slots[slot]
                .get_or_insert_with(|| Expression::variable(&value_name(id, context)))
                .clone())
        } else {
            Ok(self
                .contextual
                .entry((id, context.clone()))
                .or_insert_with(|| Expression::variable(&value_name(id, context)))
                .clone())
        }
    }

    /// Sets the expression of `id` in `context`, replacing any previous one.
    #[logfn_inputs(TRACE)]
    pub fn bind(
        &mut self,
        id: VarId,
        context: &CallContext,
        expression: Rc<Expression>,
    ) -> EngineResult<()> {
        let slot = self.check_bounds(id)?;
        if context.is_empty() {
            self.slots[slot] = Some(expression);
        } else {
            self.contextual.insert((id, context.clone()), expression);
        }
        Ok(())
    }

    /// Every binding, ordered by id and then by context depth.
    pub fn bindings(&self) -> Vec<(VarId, CallContext, Rc<Expression>)> {
        let mut result: Vec<(VarId, CallContext, Rc<Expression>)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                slot.as_ref()
                    .map(|e| (id as VarId, CallContext::default(), e.clone()))
            })
            .collect();
        result.extend(
            self.contextual
                .iter()
                .map(|((id, context), e)| (*id, context.clone(), e.clone())),
        );
        result.sort_by(|(id1, c1, _), (id2, c2, _)| {
            (id1, c1.depth(), c1.call_sites()).cmp(&(id2, c2.depth(), c2.call_sites()))
        });
        result
    }

    /// Forgets every binding while keeping the table allocated.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.contextual.clear();
    }
}
