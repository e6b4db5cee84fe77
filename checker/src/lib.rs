// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.
//
// A path sensitive and context sensitive symbolic execution engine. Paths through an
// interprocedural control flow graph are enumerated from the program entry to each call of an
// assertion function, the instructions along a path are translated into Z3 constraints over
// integers and a single array that models memory, and the assertion is proved or refuted.

#[macro_use]
extern crate log;

pub mod address_space;
pub mod analysis;
pub mod assertion_checker;
pub mod call_context;
pub mod error;
pub mod expected_errors;
pub mod explorer;
pub mod expression;
pub mod heap;
pub mod k_limits;
pub mod manual_encoder;
pub mod options;
pub mod program;
pub mod report;
pub mod session;
pub mod smt_solver;
pub mod symbol_table;
pub mod symbolic_executor;
pub mod translator;
pub mod z3_solver;
