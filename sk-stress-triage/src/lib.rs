// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the SourceKit stress tester over a compatibility build and triages the failures it
//! reports against a baseline of expected failures.
//!
//! The exit code is 0 if the compat run passed, every failure was expected, and every applicable
//! baseline entry was matched. See [`sk_triage_metadata::TriageExitCode`] for other exit codes.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
