// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::program::NodeId;

use rpds::List;
use std::fmt::{Display, Formatter, Result};

/// The stack of call sites that are active along the path being explored.
/// Contexts are persistent, so pushing or popping leaves the original intact and
/// copies are cheap enough to serve as keys of the explorer's visited set.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CallContext {
    call_sites: List<NodeId>,
}

impl Default for CallContext {
    fn default() -> Self {
        CallContext {
            call_sites: List::new(),
        }
    }
}

impl CallContext {
    /// Returns the context that results from calling through `call_site`.
    pub fn push(&self, call_site: NodeId) -> CallContext {
        CallContext {
            call_sites: self.call_sites.push_front(call_site),
        }
    }

    /// Returns the context of the caller, or None if the stack is empty.
    pub fn pop(&self) -> Option<CallContext> {
        self.call_sites
            .drop_first()
            .map(|call_sites| CallContext { call_sites })
    }

    pub fn top(&self) -> Option<NodeId> {
        self.call_sites.first().copied()
    }

    pub fn depth(&self) -> usize {
        self.call_sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.call_sites.is_empty()
    }

    /// The call sites from the outermost to the innermost.
    pub fn call_sites(&self) -> Vec<NodeId> {
        let mut sites: Vec<NodeId> = self.call_sites.iter().copied().collect();
        sites.reverse();
        sites
    }
}

impl Display for CallContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str("ctx:[ ")?;
        for site in self.call_sites() {
            write!(f, "{site} ")?;
        }
        f.write_str("]")
    }
}
