// Copyright (c) Facebook, Inc. and its affiliates.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use log_derive::logfn_inputs;

use mirai_annotations::assume;

/// A collection of report messages that are expected for a test case.
#[derive(Debug)]
pub struct ExpectedErrors {
    expected_messages: Vec<String>,
}

impl ExpectedErrors {
    /// Reads the file at the given path and scans it for instances of "//~ message".
    /// Each message becomes an element of ExpectedErrors.messages.
    #[logfn_inputs(TRACE)]
    pub fn new(path: &Path) -> std::io::Result<ExpectedErrors> {
        Ok(ExpectedErrors {
            expected_messages: load_errors(path)?,
        })
    }

    /// Checks that every message is expected and that every expected message was produced.
    #[logfn_inputs(TRACE)]
    pub fn check_messages(&mut self, messages: Vec<String>) -> bool {
        for message in messages.iter() {
            if !self.remove_message(message) {
                return false;
            }
        }
        if !self.expected_messages.is_empty() {
            println!("Expected messages not reported: {:?}", self.expected_messages);
            return false;
        }
        true
    }

    /// Removes the longest expected message contained in msg and reports whether there was one.
    #[logfn_inputs(TRACE)]
    fn remove_message(&mut self, msg: &str) -> bool {
        let mut longest_match: Option<(usize, usize)> = None;
        for (i, expected) in self.expected_messages.iter().enumerate() {
            if msg.contains(expected.as_str())
                && longest_match.map_or(true, |(_, len)| len < expected.len())
            {
                longest_match = Some((i, expected.len()));
            }
        }
        match longest_match {
            Some((pos, _)) => {
                self.expected_messages.remove(pos);
                true
            }
            None => {
                println!(
                    "Unexpected message: \"{}\". Expected: {:?}",
                    msg, self.expected_messages,
                );
                false
            }
        }
    }
}

/// Scans the contents of an expectations file for patterns of the form "//~ message"
/// and returns a vector of the matching messages.
#[logfn_inputs(TRACE)]
fn load_errors(testfile: &Path) -> std::io::Result<Vec<String>> {
    let rdr = BufReader::new(File::open(testfile)?);
    let tag = "//~";
    let mut messages = Vec::new();
    for line in rdr.lines() {
        if let Some(message) = parse_expected(&line?, tag) {
            messages.push(message);
        }
    }
    Ok(messages)
}

/// Returns the message part of the pattern "//~ message" if there is a match, otherwise None.
#[logfn_inputs(TRACE)]
fn parse_expected(line: &str, tag: &str) -> Option<String> {
    let tag_start = line.find(tag)?;
    // If the tag has been found this following must be true.
    assume!(tag_start < usize::MAX - tag.len());
    let start = tag_start + tag.len();
    Some(String::from(line[start..].trim()))
}
