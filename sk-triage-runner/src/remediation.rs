// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-to-paste baseline entries for unexpected failures.

use crate::{
    record::{BaselineEntry, FailureRecord},
    wildcard::WildcardPattern,
};

/// The issue reference placed in suggested entries, to be replaced by the user.
pub const ISSUE_PLACEHOLDER: &str = "<issue url>";

/// Three suggested baseline entries for a single unexpected failure, from most to least specific.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Remediation {
    /// Matches this exact failure.
    pub exact: BaselineEntry,

    /// Matches this failure kind and request anywhere in the same file.
    pub whole_file: BaselineEntry,

    /// Matches this failure kind and request anywhere in the same directory.
    pub whole_directory: BaselineEntry,
}

impl Remediation {
    /// Returns the suggestions along with a short label for each.
    pub fn labeled(&self) -> [(&'static str, &BaselineEntry); 3] {
        [
            ("exact match", &self.exact),
            ("whole file", &self.whole_file),
            ("whole directory", &self.whole_directory),
        ]
    }
}

/// Builds a [`Remediation`] from a failure record.
#[derive(Clone, Debug)]
pub struct RemediationBuilder<'a> {
    record: &'a FailureRecord,
    issue: &'a str,
}

impl<'a> RemediationBuilder<'a> {
    /// Creates a new builder for `record`, with [`ISSUE_PLACEHOLDER`] as the issue.
    pub fn new(record: &'a FailureRecord) -> Self {
        Self {
            record,
            issue: ISSUE_PLACEHOLDER,
        }
    }

    /// Sets the issue reference to put on every suggestion.
    pub fn issue(mut self, issue: &'a str) -> Self {
        self.issue = issue;
        self
    }

    /// Builds the three suggestions.
    pub fn build(self) -> Remediation {
        let exact = BaselineEntry {
            issue: Some(self.issue.to_owned()),
            ..self.record.to_baseline_entry()
        };
        let whole_file = BaselineEntry {
            offset: None,
            length: None,
            ..exact.clone()
        };
        let whole_directory = BaselineEntry {
            file: Some(WildcardPattern::new(directory_pattern(&self.record.file))),
            ..whole_file.clone()
        };

        Remediation {
            exact,
            whole_file,
            whole_directory,
        }
    }
}

fn directory_pattern(file: &str) -> String {
    match file.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/*"),
        None => "*".to_owned(),
    }
}
