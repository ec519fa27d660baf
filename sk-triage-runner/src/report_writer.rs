// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing regenerated baselines.

use crate::{aggregator::FailureAggregator, errors::ReportWriteError, record::BaselineEntry};
use atomicwrites::{AllowOverwrite, AtomicFile};
use camino::Utf8Path;
use itertools::Itertools;
use std::io::Write;
use tracing::debug;

/// Chooses the entries for a regenerated baseline.
///
/// Unexpected failures are always included. If `promote` is true, they're combined with every
/// loaded baseline entry for the branch; otherwise they're combined with the failures that were
/// expected in this run.
///
/// The result is sorted by file, with entries that don't constrain the file first, and contains no
/// duplicates.
pub fn select_entries(aggregator: &FailureAggregator, promote: bool) -> Vec<BaselineEntry> {
    let unexpected = aggregator
        .unexpected()
        .iter()
        .map(|record| record.to_baseline_entry());
    if promote {
        unexpected
            .chain(aggregator.store().entries().iter().cloned())
            .sorted()
            .dedup()
            .collect()
    } else {
        unexpected
            .chain(
                aggregator
                    .expected()
                    .iter()
                    .map(|record| record.to_baseline_entry()),
            )
            .sorted()
            .dedup()
            .collect()
    }
}

/// Writes `entries` to `path` as a pretty-printed JSON array.
///
/// The file is replaced atomically, so readers never observe a partially written baseline.
pub fn write(path: &Utf8Path, entries: &[BaselineEntry]) -> Result<(), ReportWriteError> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|file| {
            serde_json::to_writer_pretty(&mut *file, entries)?;
            file.write_all(b"\n")?;
            Ok(())
        })
        .map_err(|error| ReportWriteError::new(path, error))?;

    debug!("wrote {} baseline entries to {path}", entries.len());
    Ok(())
}
