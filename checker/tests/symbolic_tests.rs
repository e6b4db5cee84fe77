// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use serde_json::{json, Value};
use sse::address_space::{address_of, internal_id, is_address};
use sse::analysis::{analyze_with_session, default_capacity};
use sse::call_context::CallContext;
use sse::error::{EngineError, EngineResult};
use sse::explorer::{IcfgPath, PathExplorer, PathVisitor};
use sse::expression::{Expression, ExpressionTrait};
use sse::options::Options;
use sse::program::{ControlFlowEdge, NodeId, Program};
use sse::report::{AnalysisReport, Verdict};
use sse::session::AnalysisSession;
use sse::symbolic_executor::SymbolicExecutor;
use sse::z3_solver::{Z3ExpressionType, Z3Solver};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

fn program(description: Value) -> Program {
    Program::new(serde_json::from_value(description).unwrap()).unwrap()
}

fn intra(src: NodeId, dst: NodeId) -> Value {
    json!({ "src": src, "dst": dst, "kind": "intra" })
}

fn guarded(src: NodeId, dst: NodeId, variable: u32, successor_value: i64) -> Value {
    json!({
        "src": src,
        "dst": dst,
        "kind": "intra",
        "condition": { "variable": variable, "successor_value": successor_value }
    })
}

fn session(capacity: u32) -> AnalysisSession<Z3ExpressionType> {
    AnalysisSession::new(Box::new(Z3Solver::default()), capacity)
}

fn run(
    program: &Program,
    options: &Options,
) -> (AnalysisReport, AnalysisSession<Z3ExpressionType>) {
    let mut session = session(default_capacity(program));
    let report = analyze_with_session(program, options, &mut session).unwrap();
    (report, session)
}

fn keep_going() -> Options {
    Options {
        stop_on_violation: false,
        ..Options::default()
    }
}

#[test]
fn addresses_are_tagged_object_ids() {
    let address = address_of(42);
    assert_eq!(address, 0x7f00_002a);
    assert!(is_address(address));
    assert_eq!(internal_id(address), 42);
    assert!(!is_address(0));
    assert!(!is_address(42));
    assert!(!is_address(-1));
}

#[test]
fn stored_values_are_loaded_back() {
    let mut session = session(64);
    let p = session.object_address(3).unwrap();
    let q = session.object_address(4).unwrap();
    session.store(&p, Expression::constant(10)).unwrap();
    session.store(&q, Expression::constant(20)).unwrap();
    let loaded = session.load(&p).unwrap();
    assert_eq!(session.eval(&loaded).unwrap(), 10);
    let loaded = session.load(&q).unwrap();
    assert_eq!(session.eval(&loaded).unwrap(), 20);
}

#[test]
fn pointers_are_resolved_through_the_model() {
    let mut session = session(64);
    let object = session.object_address(5).unwrap();
    let pointer = session.value(1, &CallContext::default()).unwrap();
    session.add_constraint(pointer.equals(object.clone()));
    session.store(&pointer, Expression::constant(-3)).unwrap();
    let loaded = session.load(&object).unwrap();
    assert_eq!(session.eval(&loaded).unwrap(), -3);
}

#[test]
fn field_objects_are_distinct_and_stable() {
    let mut session = session(64);
    let base = session.object_address(2).unwrap();
    let first = session.field_address(&base, 1).unwrap();
    let second = session.field_address(&base, 2).unwrap();
    let again = session.field_address(&base, 1).unwrap();
    let itself = session.field_address(&base, 0).unwrap();
    let first = session.eval(&first).unwrap();
    let second = session.eval(&second).unwrap();
    assert_ne!(first, second);
    assert_ne!(first, address_of(2));
    assert_eq!(session.eval(&again).unwrap(), first);
    assert_eq!(session.eval(&itself).unwrap(), address_of(2));
    // Offsets accumulate along a chain of field objects.
    let nested = session
        .field_address(&Expression::constant(first), 1)
        .unwrap();
    assert_eq!(session.eval(&nested).unwrap(), second);
    assert!(session.objects().contains(&internal_id(first)));
}

#[test]
fn variables_in_different_contexts_are_different() {
    let mut session = session(64);
    let outer = session.value(7, &CallContext::default()).unwrap();
    let inner_context = CallContext::default().push(3);
    let inner = session.value(7, &inner_context).unwrap();
    assert_eq!(format!("{outer:?}"), "ValVar7");
    assert_eq!(format!("{inner:?}"), "ValVar7 ctx:[ 3 ] ");
    session.add_constraint(outer.equals(Expression::constant(1)));
    session.add_constraint(inner.equals(Expression::constant(2)));
    assert_eq!(session.eval(&outer).unwrap(), 1);
    assert_eq!(session.eval(&inner).unwrap(), 2);
}

#[test]
fn rewinding_restores_the_constraint_log_and_the_heap() {
    let mut session = session(64);
    let x = session.value(1, &CallContext::default()).unwrap();
    let p = session.object_address(2).unwrap();
    session.add_constraint(x.greater_than(Expression::constant(0)));
    let log_before: Vec<String> = session
        .constraint_log()
        .iter()
        .map(|c| format!("{c:?}"))
        .collect();
    let memory_before = format!("{:?}", session.heap().memory());

    let checkpoint = session.checkpoint();
    session.store(&p, Expression::constant(1)).unwrap();
    session.add_constraint(x.less_than(Expression::constant(0)));
    assert!(session.load(&p).is_err());
    session.rewind(checkpoint);

    let log_after: Vec<String> = session
        .constraint_log()
        .iter()
        .map(|c| format!("{c:?}"))
        .collect();
    assert_eq!(log_before, log_after);
    assert_eq!(memory_before, format!("{:?}", session.heap().memory()));
    assert!(session.eval(&x).unwrap() > 0);
}

#[test]
fn evaluates_arithmetic_and_bitwise_operators() {
    let session = session(64);
    let c = Expression::constant;
    let cases = vec![
        (c(12).add(c(10)), 22),
        (c(12).sub(c(10)), 2),
        (c(12).mul(c(10)), 120),
        (c(12).div(c(5)), 2),
        (c(12).rem(c(5)), 2),
        (c(12).bit_and(c(10)), 8),
        (c(12).bit_or(c(10)), 14),
        (c(12).bit_xor(c(10)), 6),
        (c(3).shl(c(4)), 48),
        (c(48).shr(c(4)), 3),
        (c(-16).shr(c(2)), -4),
    ];
    for (expression, expected) in cases {
        assert_eq!(session.eval(&expression).unwrap(), expected, "{expression:?}");
    }
}

#[test]
fn symbol_table_capacity_is_enforced() {
    let mut session = session(8);
    let root = CallContext::default();
    assert!(session.value(7, &root).is_ok());
    assert!(matches!(
        session.value(8, &root),
        Err(EngineError::Capacity { id: 8, capacity: 8 })
    ));
    // Half of the table is reserved for derived objects.
    assert!(matches!(
        session.object_address(4),
        Err(EngineError::Capacity { id: 4, .. })
    ));
    let base = session.object_address(1).unwrap();
    for offset in 1..5 {
        session.field_address(&base, offset).unwrap();
    }
    assert!(matches!(
        session.field_address(&base, 5),
        Err(EngineError::Capacity { .. })
    ));
}

#[test]
fn memory_operands_must_be_addresses() {
    let mut session = session(64);
    let not_a_pointer = Expression::constant(3);
    assert!(matches!(
        session.store(&not_a_pointer, Expression::constant(1)),
        Err(EngineError::InvalidOperand { value: 3 })
    ));
    assert!(matches!(
        session.load(&not_a_pointer),
        Err(EngineError::InvalidOperand { value: 3 })
    ));
    assert!(matches!(
        session.field_address(&not_a_pointer, 1),
        Err(EngineError::InvalidOperand { value: 3 })
    ));
}

#[test]
fn contradictory_constraints_are_fatal_for_eval() {
    let mut session = session(64);
    let x = session.value(1, &CallContext::default()).unwrap();
    session.add_constraint(x.equals(Expression::constant(1)));
    session.add_constraint(x.equals(Expression::constant(2)));
    assert!(matches!(
        session.eval(&x),
        Err(EngineError::ContradictoryConstraints)
    ));
}

/// a >= 5 on one side of the first branch makes the true side of a < 5 unreachable.
fn nested_branches() -> Program {
    program(json!({
        "entry": 1,
        "variables": [{ "id": 3, "kind": { "constant_value": 5 } }],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "compare", "result": 2, "left": 1, "right": 3, "predicate": "sge" },
                    { "kind": "branch", "condition": 2 }
                ]
            },
            {
                "id": 3,
                "instructions": [
                    { "kind": "compare", "result": 5, "left": 1, "right": 3, "predicate": "slt" },
                    { "kind": "branch", "condition": 5 }
                ]
            },
            { "id": 4 },
            { "id": 6 },
            { "id": 7 },
            { "id": 8, "call": { "callee": "sink" } }
        ],
        "edges": [
            guarded(1, 3, 2, 1),
            guarded(1, 4, 2, 0),
            guarded(3, 6, 5, 1),
            guarded(3, 7, 5, 0),
            intra(4, 8),
            intra(6, 8),
            intra(7, 8)
        ]
    }))
}

#[test]
fn infeasible_branches_are_pruned() {
    let program = nested_branches();
    let paths_only = Options {
        paths_only: true,
        ..Options::default()
    };
    let (report, _) = run(&program, &paths_only);
    assert_eq!(report.all_paths().len(), 3);

    let (report, session) = run(&program, &Options::default());
    let expected: BTreeSet<String> = ["START: 1->3->7->8->END", "START: 1->4->8->END"]
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(report.all_paths(), expected);
    // Sinks without an argument are reachability targets only.
    assert_eq!(report.assertions_checked(), 0);
    assert!(session.constraint_log().is_empty());
}

fn log_of(session: &AnalysisSession<Z3ExpressionType>) -> Vec<String> {
    session
        .constraint_log()
        .iter()
        .map(|c| format!("{c:?}"))
        .collect()
}

/// Wraps a symbolic executor and checks that leaving an edge restores the constraint log
/// that was in force before the edge was entered.
struct LogChecker<'session, 'program> {
    executor: SymbolicExecutor<'session, 'program, Z3ExpressionType>,
    logs: Vec<Vec<String>>,
    left: usize,
    grew: bool,
}

impl PathVisitor for LogChecker<'_, '_> {
    fn enter_edge(
        &mut self,
        edge: &ControlFlowEdge<'_>,
        before: &CallContext,
        after: &CallContext,
    ) -> EngineResult<bool> {
        let log = log_of(self.executor.session());
        let feasible = self.executor.enter_edge(edge, before, after)?;
        self.grew |= self.executor.session().constraint_log().len() > log.len();
        self.logs.push(log);
        Ok(feasible)
    }

    fn leave_edge(&mut self, edge: &ControlFlowEdge<'_>) {
        self.executor.leave_edge(edge);
        let log = self.logs.pop().unwrap();
        assert_eq!(log, log_of(self.executor.session()));
        self.left += 1;
    }

    fn visit_path(
        &mut self,
        path: &IcfgPath<'_>,
        context: &CallContext,
    ) -> EngineResult<ControlFlow<()>> {
        self.executor.visit_path(path, context)
    }
}

#[test]
fn leaving_a_subtree_restores_the_constraint_log() {
    let program = nested_branches();
    let options = Options::default();
    let mut session = session(default_capacity(&program));
    let mut checker = LogChecker {
        executor: SymbolicExecutor::new(&program, &mut session, 1, 8, true),
        logs: Vec::new(),
        left: 0,
        grew: false,
    };
    let mut explorer = PathExplorer::new(&program, options.explorer_config());
    let outcome = explorer.explore(1, 8, &mut checker).unwrap();
    assert_eq!(outcome.paths_found, 2);
    assert!(checker.grew);
    assert!(checker.left > 0);
    assert!(checker.logs.is_empty());
    let report = checker.executor.into_report();
    assert_eq!(report.paths.len(), 2);
    assert!(session.constraint_log().is_empty());
}

/// a = 5; if (a > 10) b = a; else b = 5; assert(b >= 5)
#[test]
fn assignment_on_the_feasible_branch_reaches_the_assertion() {
    let program = program(json!({
        "entry": 1,
        "variables": [
            { "id": 20, "kind": { "constant_value": 5 } },
            { "id": 21, "kind": { "constant_value": 10 } }
        ],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "copy", "result": 1, "source": 20 },
                    { "kind": "compare", "result": 2, "left": 1, "right": 21, "predicate": "sgt" },
                    { "kind": "branch", "condition": 2 }
                ]
            },
            { "id": 3, "instructions": [{ "kind": "copy", "result": 5, "source": 1 }] },
            { "id": 4, "instructions": [{ "kind": "copy", "result": 5, "source": 20 }] },
            {
                "id": 6,
                "instructions": [
                    { "kind": "compare", "result": 7, "left": 5, "right": 20, "predicate": "sge" }
                ]
            },
            { "id": 8, "call": { "callee": "assert", "arguments": [7] } }
        ],
        "edges": [
            guarded(1, 3, 2, 1),
            guarded(1, 4, 2, 0),
            intra(3, 6),
            intra(4, 6),
            intra(6, 8)
        ]
    }));
    let paths_only = Options {
        paths_only: true,
        ..Options::default()
    };
    let (report, _) = run(&program, &paths_only);
    assert_eq!(report.all_paths().len(), 2);

    let (report, session) = run(&program, &keep_going());
    assert_eq!(
        report.all_paths().into_iter().collect::<Vec<_>>(),
        vec!["START: 1->4->6->8->END".to_string()]
    );
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 0);
    assert!(session.constraint_log().is_empty());
}

/// Node 2 writes through a pointer that is not an address. Whether that is fatal depends on
/// whether the sink can be reached from node 2.
fn store_through_a_non_address(dead_end: bool) -> Program {
    let mut edges = vec![intra(1, 2), intra(1, 3)];
    if !dead_end {
        edges.push(intra(2, 3));
    }
    program(json!({
        "entry": 1,
        "variables": [{ "id": 6, "kind": { "constant_value": 1 } }],
        "nodes": [
            { "id": 1 },
            { "id": 2, "instructions": [{ "kind": "store", "pointer": 9, "value": 6 }] },
            { "id": 3, "call": { "callee": "assert", "arguments": [6] } }
        ],
        "edges": edges
    }))
}

#[test]
fn failures_on_dead_ends_do_not_stop_the_analysis() {
    let program = store_through_a_non_address(true);
    let (report, session) = run(&program, &Options::default());
    assert_eq!(
        report.all_paths().into_iter().collect::<Vec<_>>(),
        vec!["START: 1->3->END".to_string()]
    );
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 0);
    assert!(session.constraint_log().is_empty());
}

#[test]
fn failures_on_the_way_to_a_sink_are_fatal() {
    let program = store_through_a_non_address(false);
    let mut session = session(default_capacity(&program));
    let result = analyze_with_session(&program, &Options::default(), &mut session);
    assert!(matches!(result, Err(EngineError::InvalidOperand { .. })));
}

#[test]
fn violated_assertion_has_a_counterexample() {
    let program = program(json!({
        "entry": 1,
        "variables": [{ "id": 3, "kind": { "constant_value": 5 } }],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "compare", "result": 2, "left": 1, "right": 3, "predicate": "ne" }
                ]
            },
            { "id": 2, "call": { "callee": "assert", "arguments": [2] } }
        ],
        "edges": [intra(1, 2)]
    }));
    let (report, session) = run(&program, &Options::default());
    assert_eq!(report.violations(), 1);
    let check = report.checks().next().unwrap();
    assert_eq!(check.sink, 2);
    let Verdict::Violated {
        counterexample: Some(counterexample),
    } = &check.verdict
    else {
        panic!("expected a counterexample, got {:?}", check.verdict);
    };
    assert_eq!(counterexample.value_of("ValVar1"), Some(5));
    assert_eq!(counterexample.value_of("ValVar2"), Some(0));
    assert!(session.constraint_log().is_empty());
}

#[test]
fn counterexamples_only_mention_the_current_path() {
    let program = program(json!({
        "entry": 1,
        "variables": [{ "id": 8, "kind": { "constant_value": 7 } }],
        "nodes": [
            { "id": 1, "instructions": [{ "kind": "branch", "condition": 9 }] },
            { "id": 2, "instructions": [{ "kind": "copy", "result": 4, "source": 8 }] },
            { "id": 3 },
            { "id": 5, "call": { "callee": "assert", "arguments": [10] } }
        ],
        "edges": [guarded(1, 2, 9, 1), guarded(1, 3, 9, 0), intra(2, 5), intra(3, 5)]
    }));
    let (report, _) = run(&program, &keep_going());
    let counterexamples: Vec<_> = report
        .checks()
        .map(|check| match &check.verdict {
            Verdict::Violated {
                counterexample: Some(counterexample),
            } => counterexample.clone(),
            verdict => panic!("expected a counterexample, got {verdict:?}"),
        })
        .collect();
    assert_eq!(counterexamples.len(), 2);
    assert_eq!(counterexamples[0].value_of("ValVar4"), Some(7));
    assert_eq!(counterexamples[0].value_of("ValVar9"), Some(1));
    assert_eq!(counterexamples[1].value_of("ValVar4"), None);
    assert_eq!(counterexamples[1].value_of("ValVar9"), Some(0));
    assert_eq!(counterexamples[1].value_of("ValVar10"), Some(0));
}

#[test]
fn stop_on_violation_stops_at_the_first_failure() {
    let program = program(json!({
        "entry": 1,
        "nodes": [
            { "id": 1, "instructions": [{ "kind": "branch", "condition": 2 }] },
            { "id": 2 },
            { "id": 3 },
            { "id": 4, "call": { "callee": "assert", "arguments": [5] } }
        ],
        "edges": [intra(1, 2), intra(1, 3), intra(2, 4), intra(3, 4)]
    }));
    let (report, _) = run(&program, &Options::default());
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 1);

    let (report, _) = run(&program, &keep_going());
    assert_eq!(report.assertions_checked(), 2);
    assert_eq!(report.violations(), 2);
}

#[test]
fn select_picks_the_operand_named_by_the_condition() {
    let program = program(json!({
        "entry": 1,
        "variables": [{ "id": 6, "kind": { "constant_value": 0 } }],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "compare", "result": 5, "left": 1, "right": 6, "predicate": "sgt" },
                    { "kind": "binary", "result": 8, "left": 6, "right": 1, "operator": "sub" },
                    {
                        "kind": "select",
                        "result": 7,
                        "condition": 5,
                        "true_value": 1,
                        "false_value": 8
                    },
                    { "kind": "compare", "result": 9, "left": 7, "right": 6, "predicate": "sge" }
                ]
            },
            { "id": 2, "call": { "callee": "assert", "arguments": [9] } }
        ],
        "edges": [intra(1, 2)]
    }));
    let (report, _) = run(&program, &Options::default());
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 0);
}

#[test]
fn indexed_field_offsets_match_constant_ones() {
    let program = program(json!({
        "entry": 1,
        "variables": [
            { "id": 4, "kind": { "constant_value": 2 } },
            { "id": 10, "kind": { "constant_value": 9 } },
            { "id": 20, "kind": "object" }
        ],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "address_of", "result": 1, "object": 20 },
                    {
                        "kind": "field_offset",
                        "result": 2,
                        "base": 1,
                        "offset": {
                            "indexed": [
                                {
                                    "index": { "constant": 1 },
                                    "scale": { "pointer": { "element_count": 3 } }
                                },
                                { "index": { "variable": 4 } }
                            ]
                        }
                    },
                    { "kind": "field_offset", "result": 3, "base": 1, "offset": { "constant": 5 } },
                    { "kind": "store", "pointer": 2, "value": 10 },
                    { "kind": "load", "result": 11, "pointer": 3 },
                    { "kind": "compare", "result": 12, "left": 11, "right": 10, "predicate": "eq" }
                ]
            },
            { "id": 2, "call": { "callee": "assert", "arguments": [12] } }
        ],
        "edges": [intra(1, 2)]
    }));
    let (report, _) = run(&program, &Options::default());
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 0);
}

#[test]
fn aggregate_offsets_use_the_flattened_layout() {
    let program = program(json!({
        "entry": 1,
        "variables": [
            { "id": 10, "kind": { "constant_value": 9 } },
            { "id": 20, "kind": "object" }
        ],
        "nodes": [
            {
                "id": 1,
                "instructions": [
                    { "kind": "address_of", "result": 1, "object": 20 },
                    {
                        "kind": "field_offset",
                        "result": 2,
                        "base": 1,
                        "offset": {
                            "indexed": [{
                                "index": { "constant": 2 },
                                "scale": { "aggregate": { "flattened_indices": [0, 1, 4] } }
                            }]
                        }
                    },
                    { "kind": "field_offset", "result": 3, "base": 1, "offset": { "constant": 4 } },
                    { "kind": "store", "pointer": 3, "value": 10 },
                    { "kind": "load", "result": 11, "pointer": 2 },
                    { "kind": "compare", "result": 12, "left": 11, "right": 10, "predicate": "eq" }
                ]
            },
            { "id": 2, "call": { "callee": "assert", "arguments": [12] } }
        ],
        "edges": [intra(1, 2)]
    }));
    let (report, _) = run(&program, &Options::default());
    assert_eq!(report.violations(), 0);
    assert_eq!(report.assertions_checked(), 1);
}

#[test]
fn phi_without_a_matching_predecessor_is_an_error() {
    let program = program(json!({
        "entry": 1,
        "nodes": [
            { "id": 1, "function": 0 },
            {
                "id": 2,
                "function": 0,
                "instructions": [{
                    "kind": "phi",
                    "result": 3,
                    "incoming": [{ "value": 4, "node": 9 }]
                }]
            },
            { "id": 9, "function": 1 },
            { "id": 5, "function": 0, "call": { "callee": "assert", "arguments": [3] } }
        ],
        "edges": [intra(1, 2), intra(2, 5)]
    }));
    let mut session = session(default_capacity(&program));
    let result = analyze_with_session(&program, &Options::default(), &mut session);
    assert!(matches!(
        result,
        Err(EngineError::PhiPredecessorNotFound {
            node: 2,
            predecessor: 1
        })
    ));
}

#[test]
fn parameters_and_results_flow_through_calls() {
    // f(x) returns x + 1 and is called twice; the second call sees the first result.
    let program = program(json!({
        "entry": 1,
        "variables": [
            { "id": 1, "kind": "value", "function": 0 },
            { "id": 11, "kind": "value", "function": 1 },
            { "id": 12, "kind": "value", "function": 1 },
            { "id": 13, "kind": { "constant_value": 1 } },
            { "id": 14, "kind": { "constant_value": 2 } }
        ],
        "nodes": [
            { "id": 1, "function": 0, "call": { "callee": "f", "arguments": [1] } },
            { "id": 2, "function": 0, "call": { "callee": "f", "arguments": [3] } },
            {
                "id": 3,
                "function": 0,
                "instructions": [
                    { "kind": "binary", "result": 5, "left": 4, "right": 1, "operator": "sub" },
                    { "kind": "compare", "result": 6, "left": 5, "right": 14, "predicate": "eq" }
                ]
            },
            { "id": 4, "function": 0, "call": { "callee": "assert", "arguments": [6] } },
            {
                "id": 10,
                "function": 1,
                "instructions": [
                    { "kind": "binary", "result": 12, "left": 11, "right": 13, "operator": "add" }
                ]
            },
            { "id": 11, "function": 1 }
        ],
        "edges": [
            { "src": 1, "dst": 10, "kind": "call", "parameters": [{ "formal": 11, "actual": 1 }] },
            { "src": 2, "dst": 10, "kind": "call", "parameters": [{ "formal": 11, "actual": 3 }] },
            intra(10, 11),
            {
                "src": 11, "dst": 2, "kind": "return", "call_site": 1,
                "result": { "receiver": 3, "value": 12 }
            },
            {
                "src": 11, "dst": 3, "kind": "return", "call_site": 2,
                "result": { "receiver": 4, "value": 12 }
            },
            intra(3, 4)
        ]
    }));
    let (report, session) = run(&program, &Options::default());
    assert_eq!(
        report.all_paths().into_iter().collect::<Vec<_>>(),
        vec!["START: 1->10->11->2->10->11->3->4->END".to_string()]
    );
    assert_eq!(report.assertions_checked(), 1);
    assert_eq!(report.violations(), 0);
    assert!(session.constraint_log().is_empty());
}
