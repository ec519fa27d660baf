// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The baseline of expected failures.
//!
//! The main structure in this module is [`BaselineStore`]. A store holds the baseline entries that
//! apply to the branch under test, and tracks which of them were matched during the run. Match
//! state lives in a side table so that entries themselves stay exactly as they were loaded.

use crate::{
    errors::BaselineLoadError,
    record::{BaselineEntry, FailureRecord},
};
use camino::Utf8Path;
use std::{collections::BTreeSet, fs};
use tracing::debug;

/// The expected failures that apply to a single branch, along with per-run match state.
#[derive(Clone, Debug)]
pub struct BaselineStore {
    branch: String,
    entries: Vec<BaselineEntry>,
    matched: Vec<bool>,
}

impl BaselineStore {
    /// Loads the baseline at `path`, keeping only the entries that apply to `branch`.
    pub fn load(path: &Utf8Path, branch: &str) -> Result<Self, BaselineLoadError> {
        let contents = fs::read_to_string(path).map_err(|error| BaselineLoadError::Read {
            path: path.to_owned(),
            error,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&contents);
        let entries: Vec<BaselineEntry> = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| BaselineLoadError::Parse {
                path: path.to_owned(),
                error,
            })?;
        deserializer
            .end()
            .map_err(|error| BaselineLoadError::TrailingContent {
                path: path.to_owned(),
                error,
            })?;
        let total = entries.len();

        let store = Self::from_entries(entries, branch);
        debug!(
            "loaded {} of {total} baseline entries from {path} for branch `{branch}`",
            store.len(),
        );
        Ok(store)
    }

    /// Creates a store from in-memory entries, keeping only the entries that apply to `branch`.
    pub fn from_entries(entries: impl IntoIterator<Item = BaselineEntry>, branch: &str) -> Self {
        let entries: Vec<_> = entries
            .into_iter()
            .filter(|entry| entry.applies_to(branch))
            .collect();
        let matched = vec![false; entries.len()];
        Self {
            branch: branch.to_owned(),
            entries,
            matched,
        }
    }

    /// Returns the branch this store was loaded for.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns the entries that apply to this branch, in baseline order.
    pub fn entries(&self) -> &[BaselineEntry] {
        &self.entries
    }

    /// Returns the number of entries that apply to this branch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries apply to this branch.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks for the first entry that matches `record`.
    ///
    /// If one is found, it is marked as matched and its issue reference, if any, is copied onto
    /// `record`.
    pub fn is_expected(&mut self, record: &mut FailureRecord) -> Option<&BaselineEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry_matches(record, entry))?;
        self.matched[index] = true;

        let entry = &self.entries[index];
        if let Some(issue) = &entry.issue {
            record.issue = Some(issue.clone());
        }
        Some(entry)
    }

    #[cfg(test)]
    fn is_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    /// Returns the entries that were never matched, but whose file was exercised during the run.
    ///
    /// An entry without a `file` constraint is always eligible. An entry whose `file` pattern
    /// matches none of `seen_files` is skipped, since the run never had a chance to trigger it.
    pub fn unmatched_entries(&self, seen_files: &BTreeSet<String>) -> Vec<&BaselineEntry> {
        self.entries
            .iter()
            .zip(&self.matched)
            .filter(|(_, matched)| !**matched)
            .map(|(entry, _)| entry)
            .filter(|entry| match &entry.file {
                Some(pattern) => seen_files.iter().any(|file| pattern.is_match(file)),
                None => true,
            })
            .collect()
    }
}

/// Returns true if `entry` matches `record`.
///
/// Every constraint the entry sets must be present on the record and match its stringified value.
/// Fields the entry doesn't constrain are not compared, and neither are `branches` and `issue`.
pub fn entry_matches(record: &FailureRecord, entry: &BaselineEntry) -> bool {
    entry
        .constraints()
        .all(|(field, pattern)| match record.field_value(field) {
            Some(value) => pattern.is_match(&value),
            None => false,
        })
}
