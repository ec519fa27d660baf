// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of stress tester output lines.
//!
//! The stress tester emits two line shapes the triage engine cares about: failure reports and
//! per-file progress markers. Every other line is passed through untouched. Classification is
//! total: each line maps to exactly one [`ClassifiedLine`], and malformed input degrades to
//! [`ClassifiedLine::Unrecognized`] rather than an error.

use crate::record::ParsedFailure;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// The prefix of every failure report.
pub const FAILURE_PREFIX: &str = "[sk-stress-test] error:";

static FAILURE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\[sk-stress-test\] error: (?P<kind>.+?) invoking SourceKit request (?P<request>\S+)",
        r"(?: \((?P<refactoring>[^)]+)\))?",
        r" [oi]n .*?/project_cache/(?P<file>.+?\.swift)",
        // Anchored so the file extends to the last `.swift` before the optional tail.
        r"(?: a[ts] offset (?P<offset>\d+)(?: for length (?P<length>\d+))? with args:.*)?$",
    ))
    .unwrap()
});

static SEEN_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[sk-stress-test\] Stress testing .*?/project_cache/(?P<file>.+?\.swift)(?: part \d+ of \d+)?:",
    )
    .unwrap()
});

/// The result of classifying a single output line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClassifiedLine {
    /// A failure report.
    Failure(ParsedFailure),

    /// A progress marker for the given file, relative to the project cache.
    SeenFile(String),

    /// A line that starts with [`FAILURE_PREFIX`] but doesn't have the failure report shape.
    Unrecognized(String),

    /// Any other line.
    Ignore,
}

/// Classifies a single line of stress tester output.
///
/// A trailing carriage return is ignored.
pub fn classify(line: &str) -> ClassifiedLine {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(captures) = FAILURE_REGEX.captures(line) {
        return match parse_failure(&captures) {
            Some(parsed) => ClassifiedLine::Failure(parsed),
            None => ClassifiedLine::Unrecognized(line.to_owned()),
        };
    }
    if let Some(captures) = SEEN_FILE_REGEX.captures(line) {
        return ClassifiedLine::SeenFile(captures["file"].to_owned());
    }
    if line.starts_with(FAILURE_PREFIX) {
        return ClassifiedLine::Unrecognized(line.to_owned());
    }
    ClassifiedLine::Ignore
}

// Returns None if a numeric group doesn't fit in a u64.
fn parse_failure(captures: &Captures<'_>) -> Option<ParsedFailure> {
    let number = |name: &str| -> Option<Option<u64>> {
        match captures.name(name) {
            Some(m) => m.as_str().parse().ok().map(Some),
            None => Some(None),
        }
    };

    Some(ParsedFailure {
        failure_kind: captures["kind"].to_owned(),
        request: captures["request"].to_owned(),
        refactoring: captures.name("refactoring").map(|m| m.as_str().to_owned()),
        file: captures["file"].to_owned(),
        offset: number("offset")?,
        length: number("length")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn failure(
        kind: &str,
        request: &str,
        refactoring: Option<&str>,
        file: &str,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> ClassifiedLine {
        ClassifiedLine::Failure(ParsedFailure {
            failure_kind: kind.to_owned(),
            request: request.to_owned(),
            refactoring: refactoring.map(str::to_owned),
            file: file.to_owned(),
            offset,
            length,
        })
    }

    #[test_case(
        "[sk-stress-test] error: timed out invoking SourceKit request CursorInfo on /tmp/project_cache/Alamofire/Source/Request.swift at offset 1024 with args: [\"-sdk\"]",
        failure("timed out", "CursorInfo", None, "Alamofire/Source/Request.swift", Some(1024), None)
        ; "offset without length"
    )]
    #[test_case(
        "[sk-stress-test] error: crashed invoking SourceKit request SemanticRefactoring (ExtractExpr) in /w/project_cache/Kitura/Sources/Router.swift as offset 17 for length 9 with args: -j4",
        failure("crashed", "SemanticRefactoring", Some("ExtractExpr"), "Kitura/Sources/Router.swift", Some(17), Some(9))
        ; "refactoring with offset and length"
    )]
    #[test_case(
        "[sk-stress-test] error: failed invoking SourceKit request EditorOpen on /w/project_cache/Foo.swift",
        failure("failed", "EditorOpen", None, "Foo.swift", None, None)
        ; "no offset"
    )]
    #[test_case(
        "[sk-stress-test] error: crashed invoking SourceKit request CursorInfo on /w/project_cache/R.swift/Sources/RswiftCore/Main.swift at offset 42 with args: x",
        failure("crashed", "CursorInfo", None, "R.swift/Sources/RswiftCore/Main.swift", Some(42), None)
        ; "swift directory component"
    )]
    #[test_case(
        "[sk-stress-test] error: timed out invoking SourceKit request EditorOpen on /w/project_cache/R.swift/Sources/Main.swift",
        failure("timed out", "EditorOpen", None, "R.swift/Sources/Main.swift", None, None)
        ; "swift directory component without offset"
    )]
    #[test_case(
        "[sk-stress-test] error: crashed invoking SourceKit request CursorInfo on /w/project_cache/Pkg/A.swift at offset 5 with args: x\r",
        failure("crashed", "CursorInfo", None, "Pkg/A.swift", Some(5), None)
        ; "trailing carriage return"
    )]
    fn classify_failure(line: &str, expected: ClassifiedLine) {
        assert_eq!(classify(line), expected);
    }

    #[test_case(
        "[sk-stress-test] Stress testing /w/project_cache/Alamofire/Source/Request.swift:",
        "Alamofire/Source/Request.swift"
        ; "whole file"
    )]
    #[test_case(
        "[sk-stress-test] Stress testing /w/project_cache/Pkg/Sources/Big.swift part 2 of 5:",
        "Pkg/Sources/Big.swift"
        ; "partial file"
    )]
    #[test_case(
        "[sk-stress-test] Stress testing /w/project_cache/R.swift/Sources/Main.swift:",
        "R.swift/Sources/Main.swift"
        ; "swift directory component"
    )]
    fn classify_seen_file(line: &str, expected: &str) {
        assert_eq!(classify(line), ClassifiedLine::SeenFile(expected.to_owned()));
    }

    #[test_case("[sk-stress-test] error: weird-shape-that-does-not-match" ; "unrecognized shape")]
    #[test_case(
        "[sk-stress-test] error: crashed invoking SourceKit request CursorInfo on /w/other_dir/Foo.swift"
        ; "outside project cache"
    )]
    #[test_case(
        "[sk-stress-test] error: crashed invoking SourceKit request CursorInfo on /w/project_cache/Foo.swift at offset 99999999999999999999999 with args: x"
        ; "offset overflow"
    )]
    #[test_case(
        "[sk-stress-test] error: soft timeout invoking SourceKit request CodeComplete on /w/project_cache/Pkg/A.swift at offset 5"
        ; "offset without args tail"
    )]
    fn classify_unrecognized(line: &str) {
        assert_eq!(classify(line), ClassifiedLine::Unrecognized(line.to_owned()));
    }

    #[test_case("" ; "empty")]
    #[test_case("Building Alamofire..." ; "build output")]
    #[test_case("[sk-stress-test] warning: something" ; "other prefix")]
    #[test_case("[sk-stress-test] Stress testing /w/elsewhere/Foo.swift:" ; "progress outside project cache")]
    #[test_case("  [sk-stress-test] error: indented" ; "indented")]
    fn classify_ignore(line: &str) {
        assert_eq!(classify(line), ClassifiedLine::Ignore);
    }
}
