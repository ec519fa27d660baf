// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `sk-stress-triage` failures.
///
/// A triage run may fail for a variety of reasons. This structure documents the exit codes that
/// may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1, the same code as a failed
/// verdict.
pub enum TriageExitCode {}

impl TriageExitCode {
    /// The compat run passed, there were no unexpected failures, and every applicable baseline
    /// entry was matched.
    pub const OK: i32 = 0;

    /// The verdict was a failure: the compat run failed, there were unexpected failures, or some
    /// baseline entries were never matched.
    pub const TRIAGE_FAILED: i32 = 1;

    /// A user issue happened while setting up a triage run, for example a missing or malformed
    /// baseline file or an invalid config file.
    pub const SETUP_ERROR: i32 = 96;

    /// The stress tester could not be spawned, or its output could not be read.
    pub const STRESS_TESTER_EXEC_FAILED: i32 = 101;

    /// Writing the transcript, the regenerated baseline or the summary produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
