// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.
//

use crate::expression::{Expression, ExpressionType};
use crate::k_limits;
use crate::smt_solver::SmtResult;
use crate::smt_solver::SmtSolver;

use lazy_static::lazy_static;
use log_derive::*;
use mirai_annotations::*;
use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::fmt::{Debug, Formatter, Result};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

pub type Z3ExpressionType = z3_sys::Z3_ast;

lazy_static! {
    static ref Z3_MUTEX: Mutex<()> = Mutex::new(());
}

/// Bitwise operators reinterpret integers as vectors of this many bits.
const BIT_VECTOR_WIDTH: u32 = 32;

type Z3BinaryOp = unsafe extern "C" fn(
    c: z3_sys::Z3_context,
    t1: z3_sys::Z3_ast,
    t2: z3_sys::Z3_ast,
) -> z3_sys::Z3_ast;

type Z3VarArgOp = unsafe extern "C" fn(
    c: z3_sys::Z3_context,
    num_args: ::std::os::raw::c_uint,
    args: *const z3_sys::Z3_ast,
) -> z3_sys::Z3_ast;

fn lock() -> MutexGuard<'static, ()> {
    Z3_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Z3Solver {
    z3_context: z3_sys::Z3_context,
    z3_solver: z3_sys::Z3_solver,
    int_sort: z3_sys::Z3_sort,
    memory_sort: z3_sys::Z3_sort,
    zero: z3_sys::Z3_ast,
    number_of_backtracks: Cell<usize>,
}

impl Debug for Z3Solver {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        "Z3Solver".fmt(f)
    }
}

impl Z3Solver {
    /// Creates a solver whose satisfiability checks give up after `timeout_ms` milliseconds.
    #[logfn_inputs(TRACE)]
    pub fn new(timeout_ms: u32) -> Z3Solver {
        let _guard = lock();
        unsafe {
            let z3_sys_cfg = z3_sys::Z3_mk_config();
            let time_out = CString::new("timeout").unwrap_or_default();
            let ms = CString::new(timeout_ms.to_string()).unwrap_or_default();
            z3_sys::Z3_set_param_value(z3_sys_cfg, time_out.as_ptr(), ms.as_ptr());
            let model = CString::new("model").unwrap_or_default();
            let enabled = CString::new("true").unwrap_or_default();
            z3_sys::Z3_set_param_value(z3_sys_cfg, model.as_ptr(), enabled.as_ptr());

            let z3_context = z3_sys::Z3_mk_context(z3_sys_cfg);
            z3_sys::Z3_del_config(z3_sys_cfg);
            // Report API misuse through error codes instead of aborting the process.
            z3_sys::Z3_set_error_handler(z3_context, None);
            let z3_solver = z3_sys::Z3_mk_solver(z3_context);
            z3_sys::Z3_solver_inc_ref(z3_context, z3_solver);

            let int_sort = z3_sys::Z3_mk_int_sort(z3_context);
            let memory_sort = z3_sys::Z3_mk_array_sort(z3_context, int_sort, int_sort);
            let zero = z3_sys::Z3_mk_int64(z3_context, 0, int_sort);

            Z3Solver {
                z3_context,
                z3_solver,
                int_sort,
                memory_sort,
                zero,
                number_of_backtracks: Cell::new(0),
            }
        }
    }
}

impl Default for Z3Solver {
    #[logfn_inputs(TRACE)]
    fn default() -> Self {
        Z3Solver::new(k_limits::SOLVER_TIMEOUT_MS_DEFAULT)
    }
}

impl Drop for Z3Solver {
    fn drop(&mut self) {
        let _guard = lock();
        unsafe {
            z3_sys::Z3_solver_dec_ref(self.z3_context, self.z3_solver);
            z3_sys::Z3_del_context(self.z3_context);
        }
    }
}

impl SmtSolver<Z3ExpressionType> for Z3Solver {
    #[logfn_inputs(TRACE)]
    fn assert(&self, expression: &Z3ExpressionType) {
        let _guard = lock();
        unsafe {
            z3_sys::Z3_solver_assert(self.z3_context, self.z3_solver, *expression);
        }
    }

    #[logfn_inputs(TRACE)]
    fn backtrack(&self) {
        precondition!(self.number_of_backtracks.get() > 0);
        let _guard = lock();
        unsafe {
            z3_sys::Z3_solver_pop(self.z3_context, self.z3_solver, 1);
        }
        self.number_of_backtracks
            .set(self.number_of_backtracks.get().saturating_sub(1));
    }

    fn backtrack_depth(&self) -> usize {
        self.number_of_backtracks.get()
    }

    #[logfn_inputs(TRACE)]
    fn evaluate(&self, expression: &Expression) -> Option<i64> {
        let _guard = lock();
        let ast = self.get_as_z3_ast(expression);
        unsafe {
            let model = z3_sys::Z3_solver_get_model(self.z3_context, self.z3_solver);
            if model.is_null() {
                return None;
            }
            z3_sys::Z3_model_inc_ref(self.z3_context, model);
            let mut result: z3_sys::Z3_ast = std::ptr::null_mut();
            let evaluated = z3_sys::Z3_model_eval(self.z3_context, model, ast, true, &mut result);
            let value = if evaluated && !result.is_null() {
                self.get_numeral(result)
            } else {
                None
            };
            z3_sys::Z3_model_dec_ref(self.z3_context, model);
            value
        }
    }

    #[logfn_inputs(TRACE)]
    fn get_as_smt_predicate(&self, expression: &Expression) -> Z3ExpressionType {
        let _guard = lock();
        self.get_as_bool_z3_ast(expression)
    }

    #[logfn_inputs(TRACE)]
    fn get_model_as_string(&self) -> String {
        let _guard = lock();
        unsafe {
            let model = z3_sys::Z3_solver_get_model(self.z3_context, self.z3_solver);
            if model.is_null() {
                return String::from("no model");
            }
            z3_sys::Z3_model_inc_ref(self.z3_context, model);
            let debug_str_bytes = z3_sys::Z3_model_to_string(self.z3_context, model);
            let debug_str = CStr::from_ptr(debug_str_bytes).to_string_lossy().into_owned();
            z3_sys::Z3_model_dec_ref(self.z3_context, model);
            debug_str
        }
    }

    #[logfn_inputs(TRACE)]
    fn invert_predicate(&self, expression: &Z3ExpressionType) -> Z3ExpressionType {
        let _guard = lock();
        unsafe { z3_sys::Z3_mk_not(self.z3_context, *expression) }
    }

    #[logfn_inputs(TRACE)]
    fn reset(&self) {
        let _guard = lock();
        unsafe {
            z3_sys::Z3_solver_reset(self.z3_context, self.z3_solver);
        }
        self.number_of_backtracks.set(0);
    }

    #[logfn_inputs(TRACE)]
    fn set_backtrack_position(&self) {
        let _guard = lock();
        unsafe {
            z3_sys::Z3_solver_push(self.z3_context, self.z3_solver);
        }
        self.number_of_backtracks
            .set(self.number_of_backtracks.get() + 1);
    }

    #[logfn_inputs(TRACE)]
    fn solve(&self) -> SmtResult {
        let _guard = lock();
        unsafe {
            match z3_sys::Z3_solver_check(self.z3_context, self.z3_solver) {
                z3_sys::Z3_L_TRUE => SmtResult::Satisfiable,
                z3_sys::Z3_L_FALSE => SmtResult::Unsatisfiable,
                _ => SmtResult::Undefined,
            }
        }
    }
}

impl Z3Solver {
    /// Reads back an integer literal produced by model evaluation.
    fn get_numeral(&self, ast: z3_sys::Z3_ast) -> Option<i64> {
        unsafe {
            if !z3_sys::Z3_is_numeral_ast(self.z3_context, ast) {
                return None;
            }
            let mut value: i64 = 0;
            if z3_sys::Z3_get_numeral_int64(self.z3_context, ast, &mut value) {
                Some(value)
            } else {
                None
            }
        }
    }

    #[logfn_inputs(TRACE)]
    fn get_as_z3_ast(&self, expression: &Expression) -> z3_sys::Z3_ast {
        match expression {
            Expression::CompileTimeConstant(v) => unsafe {
                z3_sys::Z3_mk_int64(self.z3_context, *v, self.int_sort)
            },
            Expression::Variable { name } => self.general_variable(name, self.int_sort),
            Expression::Memory { name } => self.general_variable(name, self.memory_sort),
            Expression::Add { left, right } => {
                self.numeric_var_arg(left, right, z3_sys::Z3_mk_add)
            }
            Expression::Sub { left, right } => {
                self.numeric_var_arg(left, right, z3_sys::Z3_mk_sub)
            }
            Expression::Mul { left, right } => {
                self.numeric_var_arg(left, right, z3_sys::Z3_mk_mul)
            }
            Expression::Div { left, right } => self.numeric_binary(left, right, z3_sys::Z3_mk_div),
            Expression::Rem { left, right } => self.numeric_binary(left, right, z3_sys::Z3_mk_mod),
            Expression::BitAnd { left, right } => self.bv_binary(left, right, z3_sys::Z3_mk_bvand),
            Expression::BitOr { left, right } => self.bv_binary(left, right, z3_sys::Z3_mk_bvor),
            Expression::BitXor { left, right } => self.bv_binary(left, right, z3_sys::Z3_mk_bvxor),
            Expression::Shl { left, right } => self.bv_binary(left, right, z3_sys::Z3_mk_bvshl),
            Expression::Shr { left, right } => self.bv_binary(left, right, z3_sys::Z3_mk_bvashr),
            Expression::Equals { .. }
            | Expression::Ne { .. }
            | Expression::GreaterThan { .. }
            | Expression::GreaterOrEqual { .. }
            | Expression::LessThan { .. }
            | Expression::LessOrEqual { .. } => {
                // Booleans used as integers are 1 or 0.
                let predicate = self.get_as_bool_z3_ast(expression);
                unsafe {
                    let one = z3_sys::Z3_mk_int64(self.z3_context, 1, self.int_sort);
                    z3_sys::Z3_mk_ite(self.z3_context, predicate, one, self.zero)
                }
            }
            Expression::ConditionalExpression {
                condition,
                consequent,
                alternate,
            } => self.general_conditional(condition, consequent, alternate),
            Expression::Select { memory, address } => {
                let memory_ast = self.get_as_z3_ast(memory);
                let address_ast = self.get_as_z3_ast(address);
                unsafe { z3_sys::Z3_mk_select(self.z3_context, memory_ast, address_ast) }
            }
            Expression::Store {
                memory,
                address,
                value,
            } => {
                let memory_ast = self.get_as_z3_ast(memory);
                let address_ast = self.get_as_z3_ast(address);
                let value_ast = self.get_as_z3_ast(value);
                unsafe { z3_sys::Z3_mk_store(self.z3_context, memory_ast, address_ast, value_ast) }
            }
        }
    }

    #[logfn_inputs(TRACE)]
    fn get_as_bool_z3_ast(&self, expression: &Expression) -> z3_sys::Z3_ast {
        match expression {
            Expression::Equals { left, right } => {
                self.general_relational(left, right, z3_sys::Z3_mk_eq)
            }
            Expression::Ne { left, right } => {
                let eq = self.general_relational(left, right, z3_sys::Z3_mk_eq);
                unsafe { z3_sys::Z3_mk_not(self.z3_context, eq) }
            }
            Expression::GreaterThan { left, right } => {
                self.general_relational(left, right, z3_sys::Z3_mk_gt)
            }
            Expression::GreaterOrEqual { left, right } => {
                self.general_relational(left, right, z3_sys::Z3_mk_ge)
            }
            Expression::LessThan { left, right } => {
                self.general_relational(left, right, z3_sys::Z3_mk_lt)
            }
            Expression::LessOrEqual { left, right } => {
                self.general_relational(left, right, z3_sys::Z3_mk_le)
            }
            Expression::ConditionalExpression {
                condition,
                consequent,
                alternate,
            } if expression.infer_type() == ExpressionType::Bool => {
                let condition_ast = self.get_as_bool_z3_ast(condition);
                let consequent_ast = self.get_as_bool_z3_ast(consequent);
                let alternate_ast = self.get_as_bool_z3_ast(alternate);
                unsafe {
                    z3_sys::Z3_mk_ite(
                        self.z3_context,
                        condition_ast,
                        consequent_ast,
                        alternate_ast,
                    )
                }
            }
            _ => {
                // An integer used as a predicate is true when it is not zero.
                let ast = self.get_as_z3_ast(expression);
                unsafe {
                    let eq = z3_sys::Z3_mk_eq(self.z3_context, ast, self.zero);
                    z3_sys::Z3_mk_not(self.z3_context, eq)
                }
            }
        }
    }

    #[logfn_inputs(TRACE)]
    fn general_conditional(
        &self,
        condition: &Rc<Expression>,
        consequent: &Rc<Expression>,
        alternate: &Rc<Expression>,
    ) -> z3_sys::Z3_ast {
        let condition_ast = self.get_as_bool_z3_ast(condition);
        let consequent_ast = self.get_as_z3_ast(consequent);
        let alternate_ast = self.get_as_z3_ast(alternate);
        unsafe {
            z3_sys::Z3_mk_ite(
                self.z3_context,
                condition_ast,
                consequent_ast,
                alternate_ast,
            )
        }
    }

    /// Relational operators compare memories as arrays and everything else as integers.
    #[logfn_inputs(TRACE)]
    fn general_relational(
        &self,
        left: &Rc<Expression>,
        right: &Rc<Expression>,
        operation: Z3BinaryOp,
    ) -> z3_sys::Z3_ast {
        let left_ast = self.get_as_z3_ast(left);
        let right_ast = self.get_as_z3_ast(right);
        unsafe { operation(self.z3_context, left_ast, right_ast) }
    }

    #[logfn_inputs(TRACE)]
    fn general_variable(&self, name: &str, sort: z3_sys::Z3_sort) -> z3_sys::Z3_ast {
        let sym = self.get_symbol_for(name);
        unsafe { z3_sys::Z3_mk_const(self.z3_context, sym, sort) }
    }

    #[logfn_inputs(TRACE)]
    fn numeric_var_arg(
        &self,
        left: &Rc<Expression>,
        right: &Rc<Expression>,
        operation: Z3VarArgOp,
    ) -> z3_sys::Z3_ast {
        let left_ast = self.get_as_z3_ast(left);
        let right_ast = self.get_as_z3_ast(right);
        unsafe {
            let tmp = [left_ast, right_ast];
            operation(self.z3_context, 2, tmp.as_ptr())
        }
    }

    #[logfn_inputs(TRACE)]
    fn numeric_binary(
        &self,
        left: &Rc<Expression>,
        right: &Rc<Expression>,
        operation: Z3BinaryOp,
    ) -> z3_sys::Z3_ast {
        let left_ast = self.get_as_z3_ast(left);
        let right_ast = self.get_as_z3_ast(right);
        unsafe { operation(self.z3_context, left_ast, right_ast) }
    }

    /// Applies a bit vector operation to the 32-bit images of two integers and reads the
    /// result back as a signed integer.
    #[logfn_inputs(TRACE)]
    fn bv_binary(
        &self,
        left: &Rc<Expression>,
        right: &Rc<Expression>,
        operation: Z3BinaryOp,
    ) -> z3_sys::Z3_ast {
        let left_ast = self.get_as_z3_ast(left);
        let right_ast = self.get_as_z3_ast(right);
        unsafe {
            let left_bv = z3_sys::Z3_mk_int2bv(self.z3_context, BIT_VECTOR_WIDTH, left_ast);
            let right_bv = z3_sys::Z3_mk_int2bv(self.z3_context, BIT_VECTOR_WIDTH, right_ast);
            let result = operation(self.z3_context, left_bv, right_bv);
            z3_sys::Z3_mk_bv2int(self.z3_context, result, true)
        }
    }

    #[logfn_inputs(TRACE)]
    fn get_symbol_for(&self, name: &str) -> z3_sys::Z3_symbol {
        let sym_str = CString::new(name).unwrap_or_default();
        unsafe { z3_sys::Z3_mk_string_symbol(self.z3_context, sym_str.as_ptr()) }
    }
}
