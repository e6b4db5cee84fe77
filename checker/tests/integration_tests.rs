// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use regex::Regex;
use sse::analysis;
use sse::expected_errors::ExpectedErrors;
use sse::options::Options;
use sse::program::Program;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

// Run the programs in the tests/run-pass directory. Every program.json has a program.expected
// next to it that lists the expected report messages and optionally the flags to analyze with.
#[test]
fn run_pass() {
    let mut run_pass_path = PathBuf::from_str("tests/run-pass").unwrap();
    if !run_pass_path.exists() {
        run_pass_path = PathBuf::from_str("checker/tests/run-pass").unwrap();
    }
    assert_eq!(run_directory(run_pass_path), 0);
}

// Iterates through the program files in the directory at the given path and runs each as a
// separate test case, in parallel.
fn run_directory(directory_path: PathBuf) -> usize {
    let mut file_names = Vec::new();
    for entry in WalkDir::new(directory_path)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        file_names.push(entry.path().to_str().unwrap().to_string());
    }
    assert!(!file_names.is_empty(), "no test programs found");
    file_names
        .into_par_iter()
        .fold(|| 0, |acc, file_name| acc + self::run_test_case(file_name))
        .reduce(|| 0, |acc, code| acc + code)
}

// Analyzes the single program found in file_name and matches the report against the
// expectations. Returns 1 if the test case failed.
fn run_test_case(file_name: String) -> usize {
    let expected_path = Path::new(&file_name).with_extension("expected");
    let mut options = Options::default();
    {
        let expected_content = read_to_string(&expected_path).unwrap();
        let options_re = Regex::new(r"(?m)^\s*//\s*SSE_FLAGS\s(?P<flags>.*)$").unwrap();
        if let Some(captures) = options_re.captures(&expected_content) {
            options.parse_from_str(&captures["flags"]);
        }
    }
    let program = match Program::load(Path::new(&file_name)) {
        Ok(program) => program,
        Err(e) => {
            println!("{file_name} could not be loaded: {e}");
            return 1;
        }
    };
    let report = match analysis::analyze(&program, &options) {
        Ok(report) => report,
        Err(e) => {
            println!("{file_name} could not be analyzed: {e}");
            return 1;
        }
    };
    let mut expected_errors = ExpectedErrors::new(&expected_path).unwrap();
    if expected_errors.check_messages(report.messages()) {
        0
    } else {
        println!("{file_name} failed");
        1
    }
}
