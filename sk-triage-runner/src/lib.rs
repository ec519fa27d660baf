// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for triaging SourceKit stress tester runs.
//!
//! A run flows through these modules in order: [`runner`] owns the stress tester process and
//! streams its output through [`classify`], the classified lines are accumulated by
//! [`aggregator`] and checked against the expected failures in [`baseline`], and at the end
//! [`report_writer`] writes a regenerated baseline.

pub mod aggregator;
pub mod baseline;
pub mod classify;
pub mod config;
pub mod errors;
mod helpers;
pub mod record;
pub mod remediation;
pub mod report_writer;
pub mod reporter;
pub mod runner;
pub mod summary;
pub mod wildcard;
