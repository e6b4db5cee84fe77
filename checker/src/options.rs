// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use crate::explorer::ExplorerConfig;
use crate::k_limits;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, Command};

/// The callees that are treated as assertions when no --sink option is given.
pub const DEFAULT_SINK_FUNCTIONS: [&str; 3] = ["assert", "svf_assert", "sink"];

/// Creates the clap::Command metadata for argument parsing.
fn make_options_parser() -> Command {
    Command::new("sse")
    .no_binary_name(true)
    .version("v0.3.0")
    .arg(Arg::new("max_symbols")
        .long("max_symbols")
        .value_parser(value_parser!(u32))
        .help("The capacity of the symbol table.")
        .long_help("Variable ids at or beyond this number are rejected. Half of the table is reserved for objects derived through field offsets. The default is ten times the largest variable id of the program."))
    .arg(Arg::new("max_paths")
        .long("max_paths")
        .value_parser(value_parser!(usize))
        .help("The maximum number of paths explored per sink.")
        .long_help("The default is 100000."))
    .arg(Arg::new("max_path_length")
        .long("max_path_length")
        .value_parser(value_parser!(usize))
        .help("Paths with more edges than this are not explored.")
        .long_help("The default is 10000."))
    .arg(Arg::new("max_call_depth")
        .long("max_call_depth")
        .value_parser(value_parser!(usize))
        .help("Calls nested deeper than this are not followed.")
        .long_help("This bounds the unrolling of recursion. The default is 32."))
    .arg(Arg::new("solver_timeout")
        .long("solver_timeout")
        .value_parser(value_parser!(u32))
        .help("The number of milliseconds Z3 may spend on one satisfiability check.")
        .long_help("The default is 5000. A check that times out keeps a branch feasible and makes an assertion fail."))
    .arg(Arg::new("keep_going")
        .long("keep_going")
        .action(ArgAction::SetTrue)
        .help("Keep checking assertions after one has failed."))
    .arg(Arg::new("nested_sinks")
        .long("nested_sinks")
        .action(ArgAction::SetTrue)
        .help("Also check sinks that are reached inside a callee.")
        .long_help("By default a path only counts when it reaches the sink with an empty call stack."))
    .arg(Arg::new("paths_only")
        .long("paths_only")
        .action(ArgAction::SetTrue)
        .help("Only enumerate paths, without translating them."))
    .arg(Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the report as JSON."))
    .arg(Arg::new("sink")
        .long("sink")
        .action(ArgAction::Append)
        .help("The name of a function whose calls are assertions. May be repeated.")
        .long_help("The default sinks are assert, svf_assert and sink."))
    .arg(Arg::new("programs")
        .action(ArgAction::Append)
        .help("JSON files with the program representations to analyze."))
}

/// Represents options passed to the engine.
#[derive(Clone, Debug)]
pub struct Options {
    pub max_symbols: Option<u32>,
    pub max_paths: usize,
    pub max_path_length: usize,
    pub max_call_depth: usize,
    pub solver_timeout: u32,
    pub stop_on_violation: bool,
    pub nested_sinks: bool,
    pub paths_only: bool,
    pub json: bool,
    pub sink_functions: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_symbols: None,
            max_paths: k_limits::MAX_PATHS_DEFAULT,
            max_path_length: k_limits::MAX_PATH_LENGTH_DEFAULT,
            max_call_depth: k_limits::MAX_CALL_DEPTH_DEFAULT,
            solver_timeout: k_limits::SOLVER_TIMEOUT_MS_DEFAULT,
            stop_on_violation: true,
            nested_sinks: false,
            paths_only: false,
            json: false,
            sink_functions: DEFAULT_SINK_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Options {
    /// Parse options from an argument string. The argument string will be split using unix
    /// shell escaping rules. Returns the positional arguments.
    pub fn parse_from_str(&mut self, s: &str) -> Vec<String> {
        match shellwords::split(s) {
            Ok(args) => self.parse(&args),
            Err(e) => make_options_parser()
                .error(
                    ErrorKind::InvalidValue,
                    format!("Cannot parse argument string: {e:?}"),
                )
                .exit(),
        }
    }

    /// Parses options from a list of strings and returns the positional arguments,
    /// which name the programs to analyze. Invalid options end the process with a usage message.
    pub fn parse(&mut self, args: &[String]) -> Vec<String> {
        let matches = make_options_parser().get_matches_from(args.iter());
        if let Some(max_symbols) = matches.get_one::<u32>("max_symbols") {
            self.max_symbols = Some(*max_symbols);
        }
        if let Some(max_paths) = matches.get_one::<usize>("max_paths") {
            self.max_paths = *max_paths;
        }
        if let Some(max_path_length) = matches.get_one::<usize>("max_path_length") {
            self.max_path_length = *max_path_length;
        }
        if let Some(max_call_depth) = matches.get_one::<usize>("max_call_depth") {
            self.max_call_depth = *max_call_depth;
        }
        if let Some(timeout) = matches.get_one::<u32>("solver_timeout") {
            self.solver_timeout = *timeout;
        }
        if matches.get_flag("keep_going") {
            self.stop_on_violation = false;
        }
        if matches.get_flag("nested_sinks") {
            self.nested_sinks = true;
        }
        if matches.get_flag("paths_only") {
            self.paths_only = true;
        }
        if matches.get_flag("json") {
            self.json = true;
        }
        if let Some(sinks) = matches.get_many::<String>("sink") {
            self.sink_functions = sinks.cloned().collect();
        }
        matches
            .get_many::<String>("programs")
            .map(|programs| programs.cloned().collect())
            .unwrap_or_default()
    }

    pub fn explorer_config(&self) -> ExplorerConfig {
        ExplorerConfig {
            max_paths: self.max_paths,
            max_path_length: self.max_path_length,
            max_call_depth: self.max_call_depth,
            nested_sinks: self.nested_sinks,
        }
    }
}
