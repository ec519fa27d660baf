// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the machine-readable output of `sk-stress-triage`.
//!
//! The main types are [`TriageSummary`], written with `--summary-json`, and [`TriageExitCode`],
//! which documents the exit codes the binary may produce.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
