// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

// Somewhat arbitrary constants used to bound the path explorer and the symbolic state so that
// analysis of graphs with very many loop free paths still terminates.

/// The symbol table holds this many slots per variable id known to the program.
/// The upper half of the table is reserved for derived (field) objects.
pub const SYMBOL_TABLE_SCALE: u32 = 10;

/// Small programs still get a table large enough to hold a few derived objects.
pub const MIN_SYMBOL_TABLE_CAPACITY: u32 = 64;

/// Stop enumerating after this many paths have been recorded for a single sink.
pub const MAX_PATHS_DEFAULT: usize = 100_000;

/// Paths longer than this many edges are pruned.
pub const MAX_PATH_LENGTH_DEFAULT: usize = 10_000;

/// Calls nested deeper than this are not followed. Recursive callees push a new calling
/// context on every call, so this is what bounds the exploration of recursion.
pub const MAX_CALL_DEPTH_DEFAULT: usize = 32;

/// Milliseconds Z3 may spend on a single satisfiability check.
pub const SOLVER_TIMEOUT_MS_DEFAULT: u32 = 5_000;
