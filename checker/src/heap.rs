// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::address_space::is_address;
use crate::error::{EngineError, EngineResult};
use crate::expression::{Expression, ExpressionTrait};

use std::rc::Rc;

/// The name of the array constant that holds the initial contents of memory.
pub const MEMORY_NAME: &str = "loc2ValMap";

/// Memory is a single functional array from addresses to values. A store produces a new
/// array term that wraps the previous one, so every earlier version stays visible to the
/// solver through the terms that mention it.
#[derive(Debug)]
pub struct SymbolicHeap {
    memory: Rc<Expression>,
}

impl Default for SymbolicHeap {
    fn default() -> Self {
        SymbolicHeap {
            memory: Expression::memory(MEMORY_NAME),
        }
    }
}

impl SymbolicHeap {
    /// The current version of memory.
    pub fn memory(&self) -> &Rc<Expression> {
        &self.memory
    }

    /// Reinstates a version captured earlier by a checkpoint.
    pub fn restore(&mut self, memory: Rc<Expression>) {
        self.memory = memory;
    }

    pub fn store(&mut self, address: i64, value: Rc<Expression>) -> EngineResult<()> {
        if !is_address(address) {
            return Err(EngineError::InvalidOperand { value: address });
        }
        self.memory = self.memory.store(Expression::constant(address), value);
        Ok(())
    }

    pub fn load(&self, address: i64) -> EngineResult<Rc<Expression>> {
        if !is_address(address) {
            return Err(EngineError::InvalidOperand { value: address });
        }
        Ok(self.memory.select(Expression::constant(address)))
    }

    /// Forgets every store.
    pub fn reset(&mut self) {
        self.memory = Expression::memory(MEMORY_NAME);
    }
}
