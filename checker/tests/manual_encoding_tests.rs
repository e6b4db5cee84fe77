// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

// Small programs whose constraints are written by hand, the way a front end would emit them.

use sse::error::EngineError;
use sse::expression::{Expression, ExpressionTrait};
use sse::manual_encoder::ManualEncoder;
use sse::z3_solver::{Z3ExpressionType, Z3Solver};

fn encoder() -> ManualEncoder<Z3ExpressionType> {
    ManualEncoder::new(Box::new(Z3Solver::default()), 64)
}

fn c(value: i64) -> std::rc::Rc<Expression> {
    Expression::constant(value)
}

// a = 0; b = a + 1; assert(b > 0)
#[test]
fn test0() {
    let mut encoder = encoder();
    encoder.assign("a", c(0)).unwrap();
    let a = encoder.value("a").unwrap();
    encoder.assign("b", a.add(c(1))).unwrap();
    let b = encoder.value("b").unwrap();
    assert!(encoder.check_negated(&b.greater_than(c(0))));
    assert_eq!(encoder.evaluate("b").unwrap(), 1);
}

// p = malloc; *p = 5; q = *p; assert(q == 5)
#[test]
fn test1() {
    let mut encoder = encoder();
    let object = encoder.object_address("malloc1").unwrap();
    encoder.assign("p", object).unwrap();
    let p = encoder.value("p").unwrap();
    encoder.store(&p, c(5)).unwrap();
    let loaded = encoder.load(&p).unwrap();
    encoder.assign("q", loaded).unwrap();
    let q = encoder.value("q").unwrap();
    assert!(encoder.check_negated(&q.equals(c(5))));
    assert_eq!(encoder.evaluate("q").unwrap(), 5);
}

// p = malloc; q = malloc; *p = 3; *q = 5; x = *p; y = *q; assert(x + y == 8)
#[test]
fn test2() {
    let mut encoder = encoder();
    let p = encoder.object_address("malloc1").unwrap();
    let q = encoder.object_address("malloc2").unwrap();
    encoder.store(&p, c(3)).unwrap();
    encoder.store(&q, c(5)).unwrap();
    let x = encoder.load(&p).unwrap();
    encoder.assign("x", x).unwrap();
    let y = encoder.load(&q).unwrap();
    encoder.assign("y", y).unwrap();
    let x = encoder.value("x").unwrap();
    let y = encoder.value("y").unwrap();
    assert!(encoder.check_negated(&x.add(y).equals(c(8))));
}

// struct { int f0; int f1; } *p = malloc; p->f0 = 3; p->f1 = 5; assert(p->f0 + 2 == p->f1)
#[test]
fn test3() {
    let mut encoder = encoder();
    let p = encoder.object_address("malloc1").unwrap();
    let f0 = encoder.field_address(&p, 0).unwrap();
    let f1 = encoder.field_address(&p, 1).unwrap();
    encoder.store(&f0, c(3)).unwrap();
    encoder.store(&f1, c(5)).unwrap();
    let x = encoder.load(&f0).unwrap();
    let y = encoder.load(&f1).unwrap();
    assert!(encoder.check_negated(&x.add(c(2)).equals(y)));
    // Offset 0 is the object itself.
    let again = encoder.field_address(&p, 0).unwrap();
    let loaded = encoder.load(&again).unwrap();
    assert_eq!(encoder.eval(&loaded).unwrap(), 3);
}

// if (a > 10) { b = a + 1; assert(b > 11) }
#[test]
fn test4() {
    let mut encoder = encoder();
    let a = encoder.value("a").unwrap();
    encoder.add_constraint(a.greater_than(c(10)));
    encoder.assign("b", a.add(c(1))).unwrap();
    let b = encoder.value("b").unwrap();
    assert!(encoder.check_negated(&b.greater_than(c(11))));
    assert!(!encoder.check_negated(&b.greater_than(c(12))));
}

// x = 3 * 4; y = x ^ 5; z = y << 1
#[test]
fn test5() {
    let mut encoder = encoder();
    encoder.assign("x", c(3).mul(c(4))).unwrap();
    let x = encoder.value("x").unwrap();
    encoder.assign("y", x.bit_xor(c(5))).unwrap();
    let y = encoder.value("y").unwrap();
    encoder.assign("z", y.shl(c(1))).unwrap();
    assert_eq!(encoder.evaluate("x").unwrap(), 12);
    assert_eq!(encoder.evaluate("y").unwrap(), 9);
    assert_eq!(encoder.evaluate("z").unwrap(), 18);
}

// An unconstrained input can be anything.
#[test]
fn test6() {
    let mut encoder = encoder();
    let a = encoder.value("a").unwrap();
    assert!(!encoder.check_negated(&a.greater_than(c(0))));
    assert!(encoder.check_negated(&a.equals(a.clone())));
}

// a = cond ? 10 : 20; assert(a >= 10)
#[test]
fn test7() {
    let mut encoder = encoder();
    let cond = encoder.value("cond").unwrap();
    let a = cond
        .greater_than(c(0))
        .conditional_expression(c(10), c(20));
    encoder.assign("a", a).unwrap();
    let a = encoder.value("a").unwrap();
    assert!(encoder.check_negated(&a.greater_or_equal(c(10))));
    encoder.add_constraint(cond.less_or_equal(c(0)));
    assert_eq!(encoder.evaluate("a").unwrap(), 20);
}

// check_negated does not leave the negated predicate behind.
#[test]
fn test8() {
    let mut encoder = encoder();
    encoder.assign("a", c(7)).unwrap();
    let a = encoder.value("a").unwrap();
    assert!(!encoder.check_negated(&a.equals(c(8))));
    assert_eq!(encoder.evaluate("a").unwrap(), 7);
    assert_eq!(encoder.session().constraint_log().len(), 1);
}

// Storing through something that is not an address is rejected.
#[test]
fn test9() {
    let mut encoder = encoder();
    encoder.assign("p", c(12)).unwrap();
    let p = encoder.value("p").unwrap();
    assert!(matches!(
        encoder.store(&p, c(1)),
        Err(EngineError::InvalidOperand { value: 12 })
    ));
}

// reset forgets names, constraints and memory.
#[test]
fn test10() {
    let mut encoder = encoder();
    encoder.assign("a", c(1)).unwrap();
    let p = encoder.object_address("malloc1").unwrap();
    encoder.store(&p, c(4)).unwrap();
    assert!(encoder.has("a"));
    encoder.reset();
    assert!(!encoder.has("a"));
    assert!(encoder.session().constraint_log().is_empty());
    encoder.assign("a", c(2)).unwrap();
    assert_eq!(encoder.evaluate("a").unwrap(), 2);
}

// int a[3]; a[0] = 1; a[1] = 2; i = input in [1, 2]; a[i] = 5; assert(a[0] == 1)
#[test]
fn test11() {
    let mut encoder = encoder();
    let a = encoder.object_address("array").unwrap();
    let a1 = encoder.field_address(&a, 1).unwrap();
    encoder.store(&a, c(1)).unwrap();
    encoder.store(&a1, c(2)).unwrap();
    let i = encoder.value("i").unwrap();
    encoder.add_constraint(i.greater_or_equal(c(1)));
    encoder.add_constraint(i.less_or_equal(c(2)));
    // The index is resolved in the current model before the element address is computed.
    let index = encoder.evaluate("i").unwrap();
    let ai = encoder.field_address(&a, index).unwrap();
    encoder.store(&ai, c(5)).unwrap();
    let a0 = encoder.load(&a).unwrap();
    assert!(encoder.check_negated(&a0.equals(c(1))));
    let element = encoder.load(&ai).unwrap();
    assert_eq!(encoder.eval(&element).unwrap(), 5);
}

// x = 0; for (i = 0; i < 3; i++) x = x + i; assert(x == 3), with the loop unrolled
#[test]
fn test12() {
    let mut encoder = encoder();
    encoder.assign("x0", c(0)).unwrap();
    for i in 0..3 {
        let previous = encoder.value(&format!("x{i}")).unwrap();
        encoder
            .assign(&format!("x{}", i + 1), previous.add(c(i)))
            .unwrap();
    }
    let x = encoder.value("x3").unwrap();
    assert!(encoder.check_negated(&x.equals(c(3))));
}

// int foo(int z) { return z + 1; } x = foo(1); y = foo(x); assert(y == 3)
// Every call gets its own copy of foo's variables.
#[test]
fn test13() {
    let mut encoder = encoder();
    encoder.assign("foo.z ctx:[ 1 ]", c(1)).unwrap();
    let z1 = encoder.value("foo.z ctx:[ 1 ]").unwrap();
    encoder.assign("foo.ret ctx:[ 1 ]", z1.add(c(1))).unwrap();
    let ret1 = encoder.value("foo.ret ctx:[ 1 ]").unwrap();
    encoder.assign("x", ret1).unwrap();

    let x = encoder.value("x").unwrap();
    encoder.assign("foo.z ctx:[ 2 ]", x).unwrap();
    let z2 = encoder.value("foo.z ctx:[ 2 ]").unwrap();
    encoder.assign("foo.ret ctx:[ 2 ]", z2.add(c(1))).unwrap();
    let ret2 = encoder.value("foo.ret ctx:[ 2 ]").unwrap();
    encoder.assign("y", ret2).unwrap();

    let y = encoder.value("y").unwrap();
    assert!(encoder.check_negated(&y.equals(c(3))));
    assert_eq!(encoder.evaluate("foo.z ctx:[ 1 ]").unwrap(), 1);
    assert_eq!(encoder.evaluate("foo.z ctx:[ 2 ]").unwrap(), 2);
}
