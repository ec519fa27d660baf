// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the triage engine.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;

/// An error that occurred while loading a baseline file.
///
/// The baseline is a precondition for a run, so this error is always fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BaselineLoadError {
    /// The baseline file could not be read.
    #[error("failed to read baseline at `{path}`")]
    Read {
        /// The path to the baseline.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The baseline file is not a valid array of baseline entries.
    #[error("failed to parse baseline at `{path}` (at `{}`)", .error.path())]
    Parse {
        /// The path to the baseline.
        path: Utf8PathBuf,

        /// The underlying error, along with the location of the invalid element.
        #[source]
        error: serde_path_to_error::Error<serde_json::Error>,
    },

    /// The baseline file has content after the top-level array.
    #[error("failed to parse baseline at `{path}`")]
    TrailingContent {
        /// The path to the baseline.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

impl BaselineLoadError {
    /// Returns the path of the baseline that failed to load.
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            BaselineLoadError::Read { path, .. }
            | BaselineLoadError::Parse { path, .. }
            | BaselineLoadError::TrailingContent { path, .. } => path,
        }
    }
}

/// An error that occurred while writing a regenerated baseline.
#[derive(Debug, Error)]
#[error("failed to write baseline to `{path}`")]
pub struct ReportWriteError {
    path: Utf8PathBuf,
    #[source]
    error: atomicwrites::Error<io::Error>,
}

impl ReportWriteError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, error: atomicwrites::Error<io::Error>) -> Self {
        Self {
            path: path.into(),
            error,
        }
    }

    /// Returns the path that could not be written.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while driving the stress tester.
///
/// A non-zero exit from the stress tester is *not* an error: it is recorded on the run results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    /// The stress tester could not be spawned.
    #[error("failed to execute `{command}`")]
    Exec {
        /// The command line.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Reading output from the stress tester failed.
    #[error("failed to read output from `{command}`")]
    Read {
        /// The command line, or a description of the input for replays.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Waiting for the stress tester to exit failed.
    #[error("failed to wait for `{command}` to exit")]
    Wait {
        /// The command line.
        command: String,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// Writing the transcript failed.
    #[error("failed to write transcript")]
    Reporter(#[source] io::Error),
}

/// An error that occurred while parsing the triage config.
#[derive(Debug, Error)]
#[error("failed to parse triage config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file this error is for.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing the triage config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config, e.g. a TOML syntax error.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error("at `{path}`")]
    DeserializeError {
        /// The path to the invalid key.
        path: String,

        /// The underlying error.
        #[source]
        error: ConfigError,
    },

    /// A value was out of range.
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue {
        /// The key.
        key: &'static str,

        /// A description of the problem.
        message: String,
    },
}

/// An error that occurs while writing the machine-readable summary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: io::Error,
    },

    /// An error occurred while serializing JSON.
    #[error("error writing JSON output to {file}")]
    Json {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}
