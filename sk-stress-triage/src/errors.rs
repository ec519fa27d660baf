// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use sk_triage_metadata::TriageExitCode;
use sk_triage_runner::errors::*;
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that sk-stress-triage knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("current directory is invalid")]
    CurrentDirInvalid {
        #[source]
        error: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("baseline load error")]
    BaselineLoadError {
        #[from]
        err: BaselineLoadError,
    },
    #[error("no stress tester command")]
    NoStressTesterCommand,
    #[error("failed to open replay log")]
    ReplayLogOpen {
        path: Utf8PathBuf,
        #[source]
        error: std::io::Error,
    },
    #[error("runner error")]
    RunnerError {
        #[from]
        err: RunnerError,
    },
    #[error("failed to write regenerated baseline")]
    ReportWriteError {
        #[from]
        err: ReportWriteError,
    },
    #[error("failed to write summary")]
    WriteSummaryError {
        #[from]
        err: WriteEventError,
    },
    #[error("triage failed")]
    TriageFailed,
}

impl ExpectedError {
    pub(crate) fn current_dir_invalid(error: std::io::Error) -> Self {
        Self::CurrentDirInvalid { error }
    }

    pub(crate) fn replay_log_open(path: Utf8PathBuf, error: std::io::Error) -> Self {
        Self::ReplayLogOpen { path, error }
    }

    pub(crate) fn triage_failed() -> Self {
        Self::TriageFailed
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirInvalid { .. }
            | Self::ConfigParseError { .. }
            | Self::BaselineLoadError { .. }
            | Self::NoStressTesterCommand
            | Self::ReplayLogOpen { .. } => TriageExitCode::SETUP_ERROR,
            Self::RunnerError {
                err: RunnerError::Reporter(_),
            } => TriageExitCode::WRITE_OUTPUT_ERROR,
            Self::RunnerError { .. } => TriageExitCode::STRESS_TESTER_EXEC_FAILED,
            Self::ReportWriteError { .. } | Self::WriteSummaryError { .. } => {
                TriageExitCode::WRITE_OUTPUT_ERROR
            }
            Self::TriageFailed => TriageExitCode::TRIAGE_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirInvalid { error } => {
                error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::BaselineLoadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::NoStressTesterCommand => {
                error!(
                    "no stress tester command: pass one after `{}`, or set `{}` in the config",
                    "--".style(styles.bold),
                    "stress-tester.program".style(styles.bold),
                );
                None
            }
            Self::ReplayLogOpen { path, error } => {
                error!("failed to open log `{}`", path.style(styles.bold));
                Some(error as &dyn Error)
            }
            Self::RunnerError { err } => {
                match err {
                    RunnerError::Exec { command, .. } => {
                        error!("failed to execute `{}`", command.style(styles.bold))
                    }
                    other => error!("{other}"),
                }
                err.source()
            }
            Self::ReportWriteError { err } => {
                error!(
                    "failed to write regenerated baseline to `{}`",
                    err.path().style(styles.bold)
                );
                err.source()
            }
            Self::WriteSummaryError { err } => {
                error!("failed to write summary");
                Some(err as &dyn Error)
            }
            Self::TriageFailed => {
                error!("triage failed");
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: "sk_stress_triage::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
