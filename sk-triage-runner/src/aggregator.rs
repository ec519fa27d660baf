// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregation of classified lines into run results.

use crate::{
    baseline::BaselineStore,
    classify::ClassifiedLine,
    record::{BaselineEntry, FailureRecord},
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// What happened to a line fed into a [`FailureAggregator`].
#[derive(Copy, Clone, Debug)]
pub enum LineOutcome<'a> {
    /// The line produced no failure record.
    Ignored,

    /// The line was a failure that matched the baseline.
    Xfail(&'a FailureRecord),

    /// The line was a failure that is not in the baseline.
    Fail(&'a FailureRecord),
}

/// Accumulates failures, progress markers and unrecognized lines for a single run.
///
/// The aggregator only ever grows: nothing that has been recorded is removed.
#[derive(Debug)]
pub struct FailureAggregator {
    store: BaselineStore,
    expected: Vec<FailureRecord>,
    unexpected: Vec<FailureRecord>,
    unrecognized_lines: Vec<String>,
    seen_files: BTreeSet<String>,
}

impl FailureAggregator {
    /// Creates a new aggregator that checks failures against `store`.
    pub fn new(store: BaselineStore) -> Self {
        Self {
            store,
            expected: Vec::new(),
            unexpected: Vec::new(),
            unrecognized_lines: Vec::new(),
            seen_files: BTreeSet::new(),
        }
    }

    /// Processes a single classified line.
    pub fn process(&mut self, classified: ClassifiedLine) -> LineOutcome<'_> {
        match classified {
            ClassifiedLine::Failure(parsed) => {
                let mut record = FailureRecord::new(parsed, self.store.branch());
                if self.store.is_expected(&mut record).is_some() {
                    debug!("expected failure: {record}");
                    self.expected.push(record);
                    self.expected.last().map_or(LineOutcome::Ignored, LineOutcome::Xfail)
                } else {
                    debug!("unexpected failure: {record}");
                    self.unexpected.push(record);
                    self.unexpected.last().map_or(LineOutcome::Ignored, LineOutcome::Fail)
                }
            }
            ClassifiedLine::SeenFile(file) => {
                self.seen_files.insert(file);
                LineOutcome::Ignored
            }
            ClassifiedLine::Unrecognized(line) => {
                warn!("unrecognized failure line: {line}");
                self.unrecognized_lines.push(line);
                LineOutcome::Ignored
            }
            ClassifiedLine::Ignore => LineOutcome::Ignored,
        }
    }

    /// Returns the baseline store.
    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Returns the failures that matched the baseline, in the order they were seen.
    pub fn expected(&self) -> &[FailureRecord] {
        &self.expected
    }

    /// Returns the failures that didn't match the baseline, in the order they were seen.
    pub fn unexpected(&self) -> &[FailureRecord] {
        &self.unexpected
    }

    /// Returns the error lines that couldn't be parsed.
    pub fn unrecognized_lines(&self) -> &[String] {
        &self.unrecognized_lines
    }

    /// Returns the files the stress tester reported progress on.
    pub fn seen_files(&self) -> &BTreeSet<String> {
        &self.seen_files
    }

    /// Returns the baseline entries that were never matched, restricted to files seen in this run.
    pub fn unmatched_entries(&self) -> Vec<&BaselineEntry> {
        self.store.unmatched_entries(&self.seen_files)
    }
}
