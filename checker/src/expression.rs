// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result};
use std::rc::Rc;

/// Symbolic terms built by the translator and handed to the solver.
/// Integers are unbounded; bitwise operators reinterpret their operands as 32-bit vectors.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum Expression {
    /// An integer literal.
    CompileTimeConstant(i64),

    /// An unconstrained integer, identified by name.
    Variable { name: Rc<str> },

    /// An unconstrained array from addresses to values, identified by name.
    Memory { name: Rc<str> },

    /// left + right
    Add {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// left - right
    Sub {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// left * right
    Mul {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// Integer division.
    Div {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// Integer modulus.
    Rem {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    BitAnd {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    BitOr {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    BitXor {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    Shl {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// Arithmetic shift right.
    Shr {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    Equals {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    Ne {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    GreaterThan {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    GreaterOrEqual {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    LessThan {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    LessOrEqual {
        left: Rc<Expression>,
        right: Rc<Expression>,
    },

    /// if condition { consequent } else { alternate }
    ConditionalExpression {
        condition: Rc<Expression>,
        consequent: Rc<Expression>,
        alternate: Rc<Expression>,
    },

    /// The value stored at address in memory.
    Select {
        memory: Rc<Expression>,
        address: Rc<Expression>,
    },

    /// A copy of memory where address now maps to value.
    Store {
        memory: Rc<Expression>,
        address: Rc<Expression>,
        value: Rc<Expression>,
    },
}

/// The solver sort of an expression.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ExpressionType {
    Bool,
    Integer,
    Memory,
}

impl Expression {
    pub fn constant(value: i64) -> Rc<Expression> {
        Rc::new(Expression::CompileTimeConstant(value))
    }

    pub fn variable(name: &str) -> Rc<Expression> {
        Rc::new(Expression::Variable { name: name.into() })
    }

    pub fn memory(name: &str) -> Rc<Expression> {
        Rc::new(Expression::Memory { name: name.into() })
    }

    /// Adds the names of the variables and arrays, and the values of the literals, that occur
    /// in this expression.
    pub fn collect_leaves(&self, names: &mut HashSet<Rc<str>>, literals: &mut HashSet<i64>) {
        match self {
            Expression::CompileTimeConstant(v) => {
                literals.insert(*v);
            }
            Expression::Variable { name } | Expression::Memory { name } => {
                names.insert(name.clone());
            }
            Expression::Add { left, right }
            | Expression::Sub { left, right }
            | Expression::Mul { left, right }
            | Expression::Div { left, right }
            | Expression::Rem { left, right }
            | Expression::BitAnd { left, right }
            | Expression::BitOr { left, right }
            | Expression::BitXor { left, right }
            | Expression::Shl { left, right }
            | Expression::Shr { left, right }
            | Expression::Equals { left, right }
            | Expression::Ne { left, right }
            | Expression::GreaterThan { left, right }
            | Expression::GreaterOrEqual { left, right }
            | Expression::LessThan { left, right }
            | Expression::LessOrEqual { left, right } => {
                left.collect_leaves(names, literals);
                right.collect_leaves(names, literals);
            }
            Expression::ConditionalExpression {
                condition,
                consequent,
                alternate,
            } => {
                condition.collect_leaves(names, literals);
                consequent.collect_leaves(names, literals);
                alternate.collect_leaves(names, literals);
            }
            Expression::Select { memory, address } => {
                memory.collect_leaves(names, literals);
                address.collect_leaves(names, literals);
            }
            Expression::Store {
                memory,
                address,
                value,
            } => {
                memory.collect_leaves(names, literals);
                address.collect_leaves(names, literals);
                value.collect_leaves(names, literals);
            }
        }
    }

    pub fn infer_type(&self) -> ExpressionType {
        use self::ExpressionType::*;
        match self {
            Expression::Equals { .. }
            | Expression::Ne { .. }
            | Expression::GreaterThan { .. }
            | Expression::GreaterOrEqual { .. }
            | Expression::LessThan { .. }
            | Expression::LessOrEqual { .. } => Bool,
            Expression::Memory { .. } | Expression::Store { .. } => Memory,
            Expression::ConditionalExpression { consequent, .. } => consequent.infer_type(),
            _ => Integer,
        }
    }
}

impl Debug for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Expression::CompileTimeConstant(v) => v.fmt(f),
            Expression::Variable { name } | Expression::Memory { name } => f.write_str(name),
            Expression::Add { left, right } => write!(f, "({left:?} + {right:?})"),
            Expression::Sub { left, right } => write!(f, "({left:?} - {right:?})"),
            Expression::Mul { left, right } => write!(f, "({left:?} * {right:?})"),
            Expression::Div { left, right } => write!(f, "({left:?} / {right:?})"),
            Expression::Rem { left, right } => write!(f, "({left:?} % {right:?})"),
            Expression::BitAnd { left, right } => write!(f, "({left:?} & {right:?})"),
            Expression::BitOr { left, right } => write!(f, "({left:?} | {right:?})"),
            Expression::BitXor { left, right } => write!(f, "({left:?} ^ {right:?})"),
            Expression::Shl { left, right } => write!(f, "({left:?} << {right:?})"),
            Expression::Shr { left, right } => write!(f, "({left:?} >> {right:?})"),
            Expression::Equals { left, right } => write!(f, "({left:?} == {right:?})"),
            Expression::Ne { left, right } => write!(f, "({left:?} != {right:?})"),
            Expression::GreaterThan { left, right } => write!(f, "({left:?} > {right:?})"),
            Expression::GreaterOrEqual { left, right } => write!(f, "({left:?} >= {right:?})"),
            Expression::LessThan { left, right } => write!(f, "({left:?} < {right:?})"),
            Expression::LessOrEqual { left, right } => write!(f, "({left:?} <= {right:?})"),
            Expression::ConditionalExpression {
                condition,
                consequent,
                alternate,
            } => write!(f, "(if {condition:?} {{ {consequent:?} }} else {{ {alternate:?} }})"),
            Expression::Select { memory, address } => write!(f, "{memory:?}[{address:?}]"),
            Expression::Store {
                memory,
                address,
                value,
            } => write!(f, "{memory:?}[{address:?} := {value:?}]"),
        }
    }
}

/// Constructors for compound expressions.
pub trait ExpressionTrait: Sized {
    fn add(&self, other: Self) -> Self;
    fn sub(&self, other: Self) -> Self;
    fn mul(&self, other: Self) -> Self;
    fn div(&self, other: Self) -> Self;
    fn rem(&self, other: Self) -> Self;
    fn bit_and(&self, other: Self) -> Self;
    fn bit_or(&self, other: Self) -> Self;
    fn bit_xor(&self, other: Self) -> Self;
    fn shl(&self, other: Self) -> Self;
    fn shr(&self, other: Self) -> Self;
    fn equals(&self, other: Self) -> Self;
    fn not_equals(&self, other: Self) -> Self;
    fn greater_than(&self, other: Self) -> Self;
    fn greater_or_equal(&self, other: Self) -> Self;
    fn less_than(&self, other: Self) -> Self;
    fn less_or_equal(&self, other: Self) -> Self;
    fn conditional_expression(&self, consequent: Self, alternate: Self) -> Self;
    fn select(&self, address: Self) -> Self;
    fn store(&self, address: Self, value: Self) -> Self;
}

macro_rules! binary_constructor {
    ($name:ident, $variant:ident) => {
        fn $name(&self, other: Rc<Expression>) -> Rc<Expression> {
            Rc::new(Expression::$variant {
                left: self.clone(),
                right: other,
            })
        }
    };
}

impl ExpressionTrait for Rc<Expression> {
    binary_constructor!(add, Add);
    binary_constructor!(sub, Sub);
    binary_constructor!(mul, Mul);
    binary_constructor!(div, Div);
    binary_constructor!(rem, Rem);
    binary_constructor!(bit_and, BitAnd);
    binary_constructor!(bit_or, BitOr);
    binary_constructor!(bit_xor, BitXor);
    binary_constructor!(shl, Shl);
    binary_constructor!(shr, Shr);
    binary_constructor!(equals, Equals);
    binary_constructor!(not_equals, Ne);
    binary_constructor!(greater_than, GreaterThan);
    binary_constructor!(greater_or_equal, GreaterOrEqual);
    binary_constructor!(less_than, LessThan);
    binary_constructor!(less_or_equal, LessOrEqual);

    fn conditional_expression(
        &self,
        consequent: Rc<Expression>,
        alternate: Rc<Expression>,
    ) -> Rc<Expression> {
        Rc::new(Expression::ConditionalExpression {
            condition: self.clone(),
            consequent,
            alternate,
        })
    }

    fn select(&self, address: Rc<Expression>) -> Rc<Expression> {
        Rc::new(Expression::Select {
            memory: self.clone(),
            address,
        })
    }

    fn store(&self, address: Rc<Expression>, value: Rc<Expression>) -> Rc<Expression> {
        Rc::new(Expression::Store {
            memory: self.clone(),
            address,
            value,
        })
    }
}
