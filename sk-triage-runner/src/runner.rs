// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running the stress tester and triaging its output.
//!
//! The main structure in this module is [`RunDriver`]. A driver owns a [`FailureAggregator`] and a
//! [`TriageReporter`]. It feeds every line of output through the classifier and the aggregator,
//! prints it to the transcript as soon as it arrives, and produces [`TriageResults`] once the
//! output is exhausted.

use crate::{
    aggregator::FailureAggregator,
    baseline::BaselineStore,
    classify::classify,
    errors::RunnerError,
    helpers::display_exited_with,
    record::BaselineEntry,
    reporter::{TriageEvent, TriageReporter},
};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use sk_triage_metadata::{TriageSummary, TriageVerdict};
use std::{
    borrow::Cow,
    io::{self, BufRead, BufReader, Write},
};
use tracing::{debug, info};

/// The environment variable holding the path to the stress tester binary.
pub const STRESS_TEST_ENV: &str = "SK_STRESS_TEST";
/// The environment variable holding the path to the compiler under test.
pub const SWIFTC_ENV: &str = "SK_STRESS_SWIFTC";
/// The environment variable holding the code completion limit.
pub const CODECOMPLETE_LIMIT_ENV: &str = "SK_STRESS_CODECOMPLETE_LIMIT";
/// The environment variable holding the silence flag, `true` or `false`.
pub const SILENT_ENV: &str = "SK_STRESS_SILENT";

/// The environment passed to the stress tester.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StressTesterEnv {
    /// The path to the stress tester binary.
    pub stress_tester_path: Utf8PathBuf,

    /// The path to the compiler under test.
    pub swiftc_path: Utf8PathBuf,

    /// The maximum number of code completion requests per file.
    pub codecomplete_limit: u32,

    /// Whether the stress tester should suppress its own progress output.
    pub silent: bool,

    /// Additional variables, set after the ones above.
    pub extra: IndexMap<String, String>,

    /// Whether the stress tester also sees the environment of this process.
    pub inherit_env: bool,
}

impl StressTesterEnv {
    /// Returns the variables this environment sets, in the order they are applied.
    pub fn vars(&self) -> Vec<(&str, Cow<'_, str>)> {
        let mut vars = vec![
            (STRESS_TEST_ENV, Cow::Borrowed(self.stress_tester_path.as_str())),
            (SWIFTC_ENV, Cow::Borrowed(self.swiftc_path.as_str())),
            (
                CODECOMPLETE_LIMIT_ENV,
                Cow::Owned(self.codecomplete_limit.to_string()),
            ),
            (
                SILENT_ENV,
                Cow::Borrowed(if self.silent { "true" } else { "false" }),
            ),
        ];
        vars.extend(
            self.extra
                .iter()
                .map(|(key, value)| (key.as_str(), Cow::Borrowed(value.as_str()))),
        );
        vars
    }
}

/// A fully specified stress tester invocation.
#[derive(Clone, Debug)]
pub struct StressTesterCommand {
    /// The program to run.
    pub program: String,

    /// Arguments to the program.
    pub args: Vec<String>,

    /// The working directory, or the current directory if `None`.
    pub dir: Option<Utf8PathBuf>,

    /// The environment contract.
    pub env: StressTesterEnv,
}

impl StressTesterCommand {
    /// Returns the command line as a shell-quoted string.
    pub fn display_command(&self) -> String {
        shell_words::join(std::iter::once(&self.program).chain(&self.args))
    }

    fn to_expression(&self) -> duct::Expression {
        let mut expression = duct::cmd(&self.program, &self.args);
        if let Some(dir) = &self.dir {
            expression = expression.dir(dir.as_std_path());
        }

        if self.env.inherit_env {
            for (key, value) in self.env.vars() {
                expression = expression.env(key, value.as_ref());
            }
        } else {
            expression = expression.full_env(
                self.env
                    .vars()
                    .into_iter()
                    .map(|(key, value)| (key, value.into_owned())),
            );
        }

        // Failure lines may go to either stream, and must be seen in emission order.
        expression.stderr_to_stdout().unchecked()
    }
}

/// Drives a single triage run.
#[derive(Debug)]
pub struct RunDriver {
    aggregator: FailureAggregator,
    reporter: TriageReporter,
}

impl RunDriver {
    /// Creates a new driver that checks failures against `store`.
    pub fn new(store: BaselineStore, reporter: TriageReporter) -> Self {
        Self {
            aggregator: FailureAggregator::new(store),
            reporter,
        }
    }

    /// Runs `command` to completion, writing the transcript to `writer`.
    ///
    /// A non-zero exit status is recorded on the results rather than returned as an error.
    pub fn run(
        mut self,
        command: &StressTesterCommand,
        mut writer: impl Write,
    ) -> Result<TriageResults, RunnerError> {
        let command_line = command.display_command();
        self.reporter
            .report_event(
                TriageEvent::RunStarted {
                    branch: self.aggregator.store().branch(),
                    baseline_len: self.aggregator.store().len(),
                    source: &command_line,
                    env: Some(&command.env),
                },
                &mut writer,
            )
            .map_err(RunnerError::Reporter)?;
        info!("running `{command_line}`");

        let handle = command
            .to_expression()
            .reader()
            .map_err(|error| RunnerError::Exec {
                command: command_line.clone(),
                error,
            })?;
        self.drive(BufReader::new(&handle), &command_line, &mut writer)?;

        let output = handle
            .try_wait()
            .map_err(|error| RunnerError::Wait {
                command: command_line.clone(),
                error,
            })?
            .ok_or_else(|| RunnerError::Wait {
                command: command_line.clone(),
                error: io::Error::other("process still running after end of output"),
            })?;

        let exit_description = if output.status.success() {
            debug!("`{command_line}` exited successfully");
            None
        } else {
            let description = display_exited_with(output.status);
            info!("`{command_line}` {description}");
            Some(description)
        };

        self.finish(exit_description, writer)
    }

    /// Triages lines from `reader`, as if they came from a stress tester that exited successfully.
    ///
    /// `source` describes the input in messages.
    pub fn drive_lines(
        mut self,
        reader: impl BufRead,
        source: &str,
        mut writer: impl Write,
    ) -> Result<TriageResults, RunnerError> {
        self.reporter
            .report_event(
                TriageEvent::RunStarted {
                    branch: self.aggregator.store().branch(),
                    baseline_len: self.aggregator.store().len(),
                    source,
                    env: None,
                },
                &mut writer,
            )
            .map_err(RunnerError::Reporter)?;
        self.drive(reader, source, &mut writer)?;
        self.finish(None, writer)
    }

    fn drive(
        &mut self,
        mut reader: impl BufRead,
        source: &str,
        mut writer: impl Write,
    ) -> Result<(), RunnerError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|error| RunnerError::Read {
                    command: source.to_owned(),
                    error,
                })?;
            if read == 0 {
                return Ok(());
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }

            let line = String::from_utf8_lossy(&buf);
            let outcome = self.aggregator.process(classify(&line));
            self.reporter
                .report_event(
                    TriageEvent::Line {
                        line: &line,
                        outcome,
                    },
                    &mut writer,
                )
                .map_err(RunnerError::Reporter)?;
        }
    }

    fn finish(
        mut self,
        exit_description: Option<String>,
        mut writer: impl Write,
    ) -> Result<TriageResults, RunnerError> {
        let results = TriageResults {
            aggregator: self.aggregator,
            exit_description,
        };
        self.reporter
            .report_event(TriageEvent::RunFinished { results: &results }, &mut writer)
            .map_err(RunnerError::Reporter)?;
        writer.flush().map_err(RunnerError::Reporter)?;
        Ok(results)
    }
}

/// The outcome of a triage run.
#[derive(Debug)]
pub struct TriageResults {
    aggregator: FailureAggregator,
    exit_description: Option<String>,
}

impl TriageResults {
    /// Returns the aggregator, with every failure seen during the run.
    pub fn aggregator(&self) -> &FailureAggregator {
        &self.aggregator
    }

    /// Returns the branch the run was triaged for.
    pub fn branch(&self) -> &str {
        self.aggregator.store().branch()
    }

    /// Returns true if the stress tester exited unsuccessfully.
    pub fn compat_run_failed(&self) -> bool {
        self.exit_description.is_some()
    }

    /// Returns a description of how the stress tester exited, if it failed.
    pub fn exit_description(&self) -> Option<&str> {
        self.exit_description.as_deref()
    }

    /// Returns the baseline entries that were not matched, but whose file was seen.
    pub fn unmatched_entries(&self) -> Vec<&BaselineEntry> {
        self.aggregator.unmatched_entries()
    }

    /// Returns the overall verdict.
    pub fn verdict(&self) -> TriageVerdict {
        if !self.compat_run_failed()
            && self.aggregator.unexpected().is_empty()
            && self.unmatched_entries().is_empty()
        {
            TriageVerdict::Pass
        } else {
            TriageVerdict::Fail
        }
    }

    /// Returns a serializable summary of this run.
    pub fn to_summary(&self) -> TriageSummary {
        let unmatched = self.unmatched_entries();
        let compat_run_failed = self.compat_run_failed();
        TriageSummary {
            branch: self.branch().to_owned(),
            compat_run_failed,
            unexpected_count: self.aggregator.unexpected().len(),
            expected_count: self.aggregator.expected().len(),
            unmatched_count: (!compat_run_failed).then_some(unmatched.len()),
            unrecognized_count: self.aggregator.unrecognized_lines().len(),
            seen_file_count: self.aggregator.seen_files().len(),
            unmatched: if compat_run_failed {
                Vec::new()
            } else {
                unmatched.iter().map(|entry| entry.to_summary()).collect()
            },
            verdict: self.verdict(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn store(json: &str) -> BaselineStore {
        let entries: Vec<BaselineEntry> = serde_json::from_str(json).unwrap();
        BaselineStore::from_entries(entries, "main")
    }

    fn drive(baseline: &str, input: &str) -> TriageResults {
        let driver = RunDriver::new(store(baseline), TriageReporter::new(false));
        let mut transcript = Vec::new();
        driver
            .drive_lines(input.as_bytes(), "<test>", &mut transcript)
            .unwrap()
    }

    #[test]
    fn env_vars_in_order() {
        let env = StressTesterEnv {
            stress_tester_path: "/opt/sk-stress-test".into(),
            swiftc_path: "/opt/swiftc".into(),
            codecomplete_limit: 1000,
            silent: true,
            extra: [("EXTRA".to_owned(), "1".to_owned())].into_iter().collect(),
            inherit_env: true,
        };
        let vars: Vec<_> = env
            .vars()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        assert_eq!(
            vars,
            [
                "SK_STRESS_TEST=/opt/sk-stress-test",
                "SK_STRESS_SWIFTC=/opt/swiftc",
                "SK_STRESS_CODECOMPLETE_LIMIT=1000",
                "SK_STRESS_SILENT=true",
                "EXTRA=1",
            ]
        );
    }

    #[test]
    fn expected_failure_passes() {
        let results = drive(
            r#"[{"file": "Foo.swift", "failureKind": "crash", "branches": ["main"]}]"#,
            "[sk-stress-test] error: crash invoking SourceKit request CursorInfo on /w/project_cache/Foo.swift\n",
        );
        assert_eq!(results.aggregator().expected().len(), 1);
        assert!(results.aggregator().unexpected().is_empty());
        assert_eq!(results.verdict(), TriageVerdict::Pass);
    }

    #[test]
    fn unexpected_failure_fails() {
        let results = drive(
            "[]",
            "[sk-stress-test] error: timeout invoking SourceKit request CodeComplete on /w/project_cache/Bar.swift at offset 120 with args: x\n",
        );
        let unexpected = results.aggregator().unexpected();
        assert_eq!(unexpected.len(), 1);
        assert_eq!(unexpected[0].offset, Some(120));
        assert_eq!(unexpected[0].length, None);
        assert_eq!(results.verdict(), TriageVerdict::Fail);
    }

    #[test]
    fn unmatched_entries_need_seen_file() {
        let baseline = r#"[{"file": "Baz.swift", "branches": ["main"]}]"#;

        let results = drive(
            baseline,
            "[sk-stress-test] Stress testing /w/project_cache/Baz.swift:\n",
        );
        assert_eq!(results.unmatched_entries().len(), 1);
        assert_eq!(results.verdict(), TriageVerdict::Fail);

        let results = drive(baseline, "nothing interesting\n");
        assert!(results.unmatched_entries().is_empty());
        assert_eq!(results.verdict(), TriageVerdict::Pass);
    }

    #[test]
    fn unrecognized_error_is_not_fatal() {
        let results = drive(
            "[]",
            "[sk-stress-test] error: weird-shape-that-does-not-match\r\n",
        );
        assert_eq!(
            results.aggregator().unrecognized_lines(),
            ["[sk-stress-test] error: weird-shape-that-does-not-match"]
        );
        assert_eq!(results.verdict(), TriageVerdict::Pass);
        assert_eq!(results.to_summary().unrecognized_count, 1);
    }

    #[test]
    fn final_line_without_newline_and_invalid_utf8() {
        let driver = RunDriver::new(store("[]"), TriageReporter::new(false));
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(
            b"[sk-stress-test] error: crashed invoking SourceKit request CursorInfo on /w/project_cache/A.swift",
        );
        let results = driver
            .drive_lines(input.as_slice(), "<test>", io::sink())
            .unwrap();
        assert_eq!(results.aggregator().unexpected().len(), 1);
    }

    #[test]
    fn summary_counts() {
        let results = drive(
            r#"[
                {"file": "Foo.swift", "branches": ["main"], "issue": "SR-1"},
                {"file": "Seen.swift", "request": "CodeComplete", "branches": ["main"]}
            ]"#,
            indoc! {"
                [sk-stress-test] Stress testing /w/project_cache/Seen.swift:
                [sk-stress-test] error: crash invoking SourceKit request CursorInfo on /w/project_cache/Foo.swift
                [sk-stress-test] error: crash invoking SourceKit request CursorInfo on /w/project_cache/Other.swift
            "},
        );
        let summary = results.to_summary();
        assert_eq!(summary.branch, "main");
        assert!(!summary.compat_run_failed);
        assert_eq!(summary.expected_count, 1);
        assert_eq!(summary.unexpected_count, 1);
        assert_eq!(summary.unmatched_count, Some(1));
        assert_eq!(summary.seen_file_count, 1);
        assert_eq!(summary.unmatched[0].file.as_deref(), Some("Seen.swift"));
        assert_eq!(summary.verdict, TriageVerdict::Fail);
    }
}
