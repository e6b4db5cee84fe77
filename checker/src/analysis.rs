// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::EngineResult;
use crate::explorer::{PathCollector, PathExplorer};
use crate::k_limits;
use crate::options::Options;
use crate::program::Program;
use crate::report::{AnalysisReport, SinkReport};
use crate::session::AnalysisSession;
use crate::symbolic_executor::SymbolicExecutor;
use crate::z3_solver::Z3Solver;

use log_derive::logfn_inputs;

/// The default size of the symbol table for `program`.
pub fn default_capacity(program: &Program) -> u32 {
    program
        .max_variable_id()
        .saturating_add(1)
        .saturating_mul(k_limits::SYMBOL_TABLE_SCALE)
        .max(k_limits::MIN_SYMBOL_TABLE_CAPACITY)
}

/// Analyzes `program` with a fresh Z3 solver configured from `options`.
pub fn analyze(program: &Program, options: &Options) -> EngineResult<AnalysisReport> {
    let capacity = options
        .max_symbols
        .unwrap_or_else(|| default_capacity(program));
    let solver = Z3Solver::new(options.solver_timeout);
    let mut session = AnalysisSession::new(Box::new(solver), capacity);
    analyze_with_session(program, options, &mut session)
}

/// Explores the paths from the program entry to every sink call, one (source, sink) pair at
/// a time, resetting `session` before each pair.
#[logfn_inputs(DEBUG)]
pub fn analyze_with_session<E>(
    program: &Program,
    options: &Options,
    session: &mut AnalysisSession<E>,
) -> EngineResult<AnalysisReport> {
    let source = program.entry();
    let mut report = AnalysisReport::default();
    let mut explorer = PathExplorer::new(program, options.explorer_config());
    for sink in program.call_sites_of(&options.sink_functions) {
        info!("exploring paths from node {source} to node {}", sink.id);
        if options.paths_only {
            let mut collector = PathCollector::default();
            let outcome = explorer.explore(source, sink.id, &mut collector)?;
            report.sinks.push(SinkReport {
                source,
                sink: sink.id,
                paths: collector.paths,
                checks: Vec::new(),
                truncated: outcome.truncated,
            });
            continue;
        }
        session.reset();
        let mut executor =
            SymbolicExecutor::new(program, session, source, sink.id, options.stop_on_violation);
        let outcome = explorer.explore(source, sink.id, &mut executor)?;
        let mut sink_report = executor.into_report();
        sink_report.truncated = outcome.truncated;
        let violated = sink_report.checks.iter().any(|c| c.verdict.is_violation());
        report.sinks.push(sink_report);
        if violated && options.stop_on_violation {
            info!("stopping at the first violated assertion");
            break;
        }
    }
    Ok(report)
}
