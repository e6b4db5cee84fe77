// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

extern crate env_logger;

use sse::analysis;
use sse::options::Options;
use sse::program::Program;
use sse::report::AnalysisReport;
use std::env;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize loggers.
    if env::var("SSE_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("SSE_LOG")
            .write_style("SSE_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let command_line_arguments: Vec<String> = env::args().skip(1).collect();
    let mut options = Options::default();
    let programs = options.parse(&command_line_arguments);
    if programs.is_empty() {
        eprintln!("usage: sse [OPTIONS] <PROGRAM.json>...");
        return ExitCode::from(2);
    }

    let mut all_hold = true;
    for file_name in programs.iter() {
        match check_program(Path::new(file_name), &options) {
            Ok(holds) => all_hold &= holds,
            Err(e) => {
                eprintln!("{file_name}: {e}");
                all_hold = false;
            }
        }
    }
    if all_hold {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Analyzes one program file, prints its report and returns true if the outcome is a pass.
fn check_program(path: &Path, options: &Options) -> Result<bool, Box<dyn std::error::Error>> {
    let program = Program::load(path)?;
    let report = analysis::analyze(&program, options)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(passes(&report, options))
}

/// In path enumeration mode a pass means that some path was found. Otherwise at least one
/// assertion has to be checked and none of them may fail.
fn passes(report: &AnalysisReport, options: &Options) -> bool {
    if options.paths_only {
        !report.all_paths().is_empty()
    } else {
        report.assertions_checked() > 0 && report.violations() == 0
    }
}
