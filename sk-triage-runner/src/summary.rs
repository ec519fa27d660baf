// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine-readable run summaries.

use crate::errors::WriteEventError;
use camino::Utf8Path;
use sk_triage_metadata::TriageSummary;
use std::{
    fs::File,
    io::{BufWriter, Write},
};

/// Writes `summary` to `path` as JSON, followed by a newline.
pub fn write_summary(path: &Utf8Path, summary: &TriageSummary) -> Result<(), WriteEventError> {
    let fs_error = |error| WriteEventError::Fs {
        file: path.to_owned(),
        error,
    };

    let file = File::create(path).map_err(fs_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(|error| WriteEventError::Json {
        file: path.to_owned(),
        error,
    })?;
    writer.write_all(b"\n").map_err(fs_error)?;
    writer.flush().map_err(fs_error)
}
