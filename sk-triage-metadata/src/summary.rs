// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// A serializable summary of a triage run.
///
/// This is the format written by `sk-stress-triage --summary-json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageSummary {
    /// The branch the run was triaged against.
    pub branch: String,

    /// True if the stress tester exited with a non-zero status.
    pub compat_run_failed: bool,

    /// The number of failures that did not match any baseline entry.
    pub unexpected_count: usize,

    /// The number of failures that matched a baseline entry.
    pub expected_count: usize,

    /// The number of applicable baseline entries that were never matched.
    ///
    /// This is `None` if the compat run failed, since an unmatched baseline is meaningless if the
    /// run did not complete.
    pub unmatched_count: Option<usize>,

    /// The number of error lines that could not be parsed.
    pub unrecognized_count: usize,

    /// The number of distinct files the stress tester reported progress for.
    pub seen_file_count: usize,

    /// The baseline entries that were never matched, in baseline order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<BaselineEntrySummary>,

    /// The overall verdict.
    pub verdict: TriageVerdict,
}

/// A summary of a single baseline entry.
///
/// All pattern fields are reported verbatim, including any `*` wildcards.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineEntrySummary {
    /// The file pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// The failure kind pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<String>,

    /// The request pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,

    /// The refactoring pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refactoring: Option<String>,

    /// The offset pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,

    /// The length pattern, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    /// The issue reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

/// The overall verdict of a triage run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriageVerdict {
    /// The run passed.
    Pass,

    /// The run failed.
    Fail,
}

impl TriageVerdict {
    /// Returns true if this is [`TriageVerdict::Pass`].
    pub fn is_pass(self) -> bool {
        matches!(self, TriageVerdict::Pass)
    }
}

impl fmt::Display for TriageVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriageVerdict::Pass => write!(f, "PASS"),
            TriageVerdict::Fail => write!(f, "FAIL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(TriageVerdict::Pass, "\"pass\"" ; "pass")]
    #[test_case(TriageVerdict::Fail, "\"fail\"" ; "fail")]
    fn verdict_serialization(verdict: TriageVerdict, expected: &str) {
        assert_eq!(serde_json::to_string(&verdict).unwrap(), expected);
    }

    #[test]
    fn summary_omits_empty_unmatched() {
        let summary = TriageSummary {
            branch: "main".to_owned(),
            compat_run_failed: true,
            unexpected_count: 1,
            expected_count: 0,
            unmatched_count: None,
            unrecognized_count: 0,
            seen_file_count: 3,
            unmatched: Vec::new(),
            verdict: TriageVerdict::Fail,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("unmatched").is_none());
        assert_eq!(value["unmatched-count"], serde_json::Value::Null);
        assert_eq!(value["compat-run-failed"], serde_json::Value::Bool(true));

        let roundtrip: TriageSummary = serde_json::from_value(value).unwrap();
        assert_eq!(roundtrip, summary);
    }
}
