// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Virtual addresses. An object id becomes an address by setting a reserved tag in its high
//! bits, so every integer either is a heap address or is a plain scalar, and a dereference
//! can tell the two apart.

use crate::error::{EngineError, EngineResult};
use crate::program::VarId;

use mirai_annotations::*;
use std::collections::HashMap;

/// The tag carried by every virtual address.
pub const ADDRESS_MASK: i64 = 0x7f00_0000;

/// Clears the tag of an address, leaving the object id.
pub const FLIPPED_ADDRESS_MASK: i64 = ADDRESS_MASK ^ 0xffff_ffff;

/// Object ids must fit below the tag.
pub const MAX_OBJECT_ID: VarId = 0x00ff_ffff;

pub fn address_of(id: VarId) -> i64 {
    precondition!(id <= MAX_OBJECT_ID);
    ADDRESS_MASK | i64::from(id)
}

pub fn is_address(value: i64) -> bool {
    value > 0 && (value & ADDRESS_MASK) == ADDRESS_MASK
}

pub fn internal_id(address: i64) -> VarId {
    (address & FLIPPED_ADDRESS_MASK) as VarId
}

/// Allocates ids for sub-objects reached through field offsets.
///
/// Primary objects use ids below half of the capacity. Derived objects are numbered from the
/// half upward, one per distinct (root object, flattened offset) pair. Offsets accumulate
/// through chains of derivations, so the element at offset 1 of the element at offset 1
/// is the element at offset 2.
#[derive(Debug)]
pub struct AddressSpace {
    capacity: u32,
    next_derived: VarId,
    derived: HashMap<(VarId, i64), VarId>,
    origins: HashMap<VarId, (VarId, i64)>,
}

impl AddressSpace {
    pub fn new(capacity: u32) -> AddressSpace {
        AddressSpace {
            capacity,
            next_derived: capacity / 2,
            derived: HashMap::new(),
            origins: HashMap::new(),
        }
    }

    /// The address of a primary object.
    pub fn object_address(&self, id: VarId) -> EngineResult<i64> {
        if id >= self.capacity / 2 || id > MAX_OBJECT_ID {
            return Err(EngineError::Capacity {
                id: u64::from(id),
                capacity: self.capacity,
            });
        }
        Ok(address_of(id))
    }

    /// Resolves the object at `offset` flattened fields from the object at `base_address`.
    /// Returns None if that is the base object itself, otherwise the id and address of the
    /// sub-object.
    pub fn field_object(
        &mut self,
        base_address: i64,
        offset: i64,
    ) -> EngineResult<Option<(VarId, i64)>> {
        if !is_address(base_address) {
            return Err(EngineError::InvalidOperand {
                value: base_address,
            });
        }
        if offset == 0 {
            return Ok(None);
        }
        let base_id = internal_id(base_address);
        let (root, base_offset) = self
            .origins
            .get(&base_id)
            .copied()
            .unwrap_or((base_id, 0));
        let total = base_offset.checked_add(offset).ok_or_else(|| {
            EngineError::InvalidFieldOffset(format!("offset {offset} overflows object {base_id}"))
        })?;
        if total < 0 {
            return Err(EngineError::InvalidFieldOffset(format!(
                "offset {offset} from object {base_id} precedes its root object {root}"
            )));
        }
        if total == 0 {
            return Ok(Some((root, address_of(root))));
        }
        if let Some(id) = self.derived.get(&(root, total)) {
            return Ok(Some((*id, address_of(*id))));
        }
        let id = self.next_derived;
        if id >= self.capacity || id > MAX_OBJECT_ID {
            return Err(EngineError::Capacity {
                id: u64::from(id),
                capacity: self.capacity,
            });
        }
        self.next_derived += 1;
        self.derived.insert((root, total), id);
        self.origins.insert(id, (root, total));
        verify!(self.derived.len() == self.origins.len());
        debug!("object {root} at offset {total} is derived object {id}");
        Ok(Some((id, address_of(id))))
    }

    pub fn clear(&mut self) {
        self.next_derived = self.capacity / 2;
        self.derived.clear();
        self.origins.clear();
    }
}
