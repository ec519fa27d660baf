// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for sk-triage-runner.

use std::process::ExitStatus;

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "failure" if `count` is 1, otherwise "failures".
    pub fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }

    /// Returns "line" if `count` is 1, otherwise "lines".
    pub fn lines_str(count: usize) -> &'static str {
        if count == 1 { "line" } else { "lines" }
    }

    /// Returns "entry" if `count` is 1, otherwise "entries".
    pub fn entries_str(count: usize) -> &'static str {
        if count == 1 { "entry" } else { "entries" }
    }

    /// Returns "file" if `count` is 1, otherwise "files".
    pub fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}

// "exited with"/"aborted with"
pub(crate) fn display_exited_with(exit_status: ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(sig) = exit_status.signal() {
            return match signal_str(sig) {
                Some(s) => format!("aborted with signal {sig} (SIG{s})"),
                None => format!("aborted with signal {sig}"),
            };
        }
    }

    match exit_status.code() {
        Some(code) => format!("exited with exit code {code}"),
        None => "exited with an unknown error".to_owned(),
    }
}

#[cfg(unix)]
fn signal_str(signal: i32) -> Option<&'static str> {
    // These signal numbers are the same on at least Linux, macOS, FreeBSD and illumos.
    match signal {
        1 => Some("HUP"),
        2 => Some("INT"),
        3 => Some("QUIT"),
        4 => Some("ILL"),
        5 => Some("TRAP"),
        6 => Some("ABRT"),
        8 => Some("FPE"),
        9 => Some("KILL"),
        11 => Some("SEGV"),
        13 => Some("PIPE"),
        14 => Some("ALRM"),
        15 => Some("TERM"),
        _ => None,
    }
}
