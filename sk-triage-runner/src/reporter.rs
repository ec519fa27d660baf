// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The live transcript of a triage run.
//!
//! Every output line is echoed as soon as it's classified. Expected failures are prefixed with
//! their issue reference, and unexpected failures are followed by suggested baseline entries.

use crate::{
    aggregator::LineOutcome,
    helpers::plural,
    record::BaselineEntry,
    remediation::RemediationBuilder,
    runner::{StressTesterEnv, TriageResults},
};
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// An event in a triage run.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum TriageEvent<'a> {
    /// The run started.
    RunStarted {
        /// The branch under test.
        branch: &'a str,

        /// The number of baseline entries active on this branch.
        baseline_len: usize,

        /// The command line, or a description of the replayed input.
        source: &'a str,

        /// The environment passed to the stress tester, if one is being run.
        env: Option<&'a StressTesterEnv>,
    },

    /// A line of output was processed.
    Line {
        /// The line, without its trailing newline.
        line: &'a str,

        /// What the line turned out to be.
        outcome: LineOutcome<'a>,
    },

    /// The output was exhausted and the stress tester exited.
    RunFinished {
        /// The results of the run.
        results: &'a TriageResults,
    },
}

/// Writes the human-readable transcript of a triage run.
#[derive(Debug)]
pub struct TriageReporter {
    styles: Styles,
    verbose: bool,
}

impl TriageReporter {
    /// Creates a new reporter.
    ///
    /// In verbose mode, the stress tester's environment is printed before the run.
    pub fn new(verbose: bool) -> Self {
        Self {
            styles: Styles::default(),
            verbose,
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Reports a triage event.
    pub fn report_event(&mut self, event: TriageEvent<'_>, mut writer: impl Write) -> io::Result<()> {
        match event {
            TriageEvent::RunStarted {
                branch,
                baseline_len,
                source,
                env,
            } => {
                write!(writer, "{:>12} ", "Triaging".style(self.styles.pass))?;
                writeln!(
                    writer,
                    "{} on branch {} against {} baseline {}",
                    source.style(self.styles.bold),
                    branch.style(self.styles.bold),
                    baseline_len.style(self.styles.count),
                    plural::entries_str(baseline_len),
                )?;
                if let Some(env) = env.filter(|_| self.verbose) {
                    self.write_env(env, &mut writer)?;
                }
            }
            TriageEvent::Line { line, outcome } => match outcome {
                LineOutcome::Ignored => writeln!(writer, "{line}")?,
                LineOutcome::Xfail(record) => {
                    let prefix = match &record.issue {
                        Some(issue) => format!("[XFAIL: {issue}]"),
                        None => "[XFAIL]".to_owned(),
                    };
                    writeln!(writer, "{} {line}", prefix.style(self.styles.xfail))?;
                }
                LineOutcome::Fail(record) => {
                    writeln!(writer, "{} {line}", "[FAIL]".style(self.styles.fail))?;
                    self.write_remediation(
                        &RemediationBuilder::new(record).build().labeled(),
                        &mut writer,
                    )?;
                }
            },
            TriageEvent::RunFinished { results } => {
                self.write_summary(results, &mut writer)?;
            }
        }

        Ok(())
    }

    fn write_env(&self, env: &StressTesterEnv, mut writer: impl Write) -> io::Result<()> {
        for (key, value) in env.vars() {
            writeln!(writer, "{:>12} {key}={value}", "")?;
        }
        if !env.inherit_env {
            writeln!(writer, "{:>12} (no other environment variables)", "")?;
        }
        Ok(())
    }

    fn write_remediation(
        &self,
        suggestions: &[(&'static str, &BaselineEntry)],
        mut writer: impl Write,
    ) -> io::Result<()> {
        writeln!(
            writer,
            "  {} to mark this failure as expected, add one of these entries to the baseline:",
            "help:".style(self.styles.help),
        )?;
        for (label, entry) in suggestions {
            writeln!(writer, "    {}", label.style(self.styles.bold))?;
            self.write_entry_json(entry, "      ", &mut writer)?;
        }
        Ok(())
    }

    fn write_entry_json(
        &self,
        entry: &BaselineEntry,
        indent: &str,
        mut writer: impl Write,
    ) -> io::Result<()> {
        let json = serde_json::to_string_pretty(entry).map_err(io::Error::other)?;
        for line in json.lines() {
            writeln!(writer, "{indent}{line}")?;
        }
        Ok(())
    }

    fn write_summary(&self, results: &TriageResults, mut writer: impl Write) -> io::Result<()> {
        let aggregator = results.aggregator();
        writeln!(writer, "{}", "-".repeat(12))?;

        write!(writer, "{:>12} ", "Compat run".style(self.styles.bold))?;
        match results.exit_description() {
            None => writeln!(writer, "{}", "passed".style(self.styles.pass))?,
            Some(description) => writeln!(
                writer,
                "{} (stress tester {description})",
                "failed".style(self.styles.fail),
            )?,
        }

        let unexpected = aggregator.unexpected().len();
        let expected = aggregator.expected().len();
        write!(writer, "{:>12} ", "Failures".style(self.styles.bold))?;
        writeln!(
            writer,
            "{} unexpected, {} expected",
            unexpected.style(if unexpected > 0 {
                self.styles.fail
            } else {
                self.styles.count
            }),
            expected.style(self.styles.count),
        )?;

        // An unmatched baseline only means something if the run completed.
        let unmatched = if results.compat_run_failed() {
            Vec::new()
        } else {
            let unmatched = results.unmatched_entries();
            write!(writer, "{:>12} ", "Unmatched".style(self.styles.bold))?;
            writeln!(
                writer,
                "{} expected {} not seen in {} tested {}",
                unmatched.len().style(if unmatched.is_empty() {
                    self.styles.count
                } else {
                    self.styles.fail
                }),
                plural::failures_str(unmatched.len()),
                aggregator.seen_files().len().style(self.styles.count),
                plural::files_str(aggregator.seen_files().len()),
            )?;
            unmatched
        };

        let unrecognized = aggregator.unrecognized_lines().len();
        if unrecognized > 0 {
            write!(writer, "{:>12} ", "Warning".style(self.styles.warning))?;
            writeln!(
                writer,
                "{} error {} could not be parsed",
                unrecognized.style(self.styles.count),
                plural::lines_str(unrecognized),
            )?;
        }

        if !unmatched.is_empty() {
            writeln!(
                writer,
                "  {} these baseline entries no longer match; remove them or fix their patterns:",
                "help:".style(self.styles.help),
            )?;
            for entry in &unmatched {
                self.write_entry_json(entry, "    ", &mut writer)?;
            }
        }

        let verdict = results.verdict();
        write!(writer, "{:>12} ", "Verdict".style(self.styles.bold))?;
        let verdict_style = if verdict.is_pass() {
            self.styles.pass
        } else {
            self.styles.fail
        };
        writeln!(writer, "{}", verdict.style(verdict_style))
    }
}

#[derive(Debug, Default)]
struct Styles {
    bold: Style,
    count: Style,
    pass: Style,
    fail: Style,
    xfail: Style,
    warning: Style,
    help: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.bold = Style::new().bold();
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.xfail = Style::new().yellow().bold();
        self.warning = Style::new().yellow().bold();
        self.help = Style::new().cyan().bold();
    }
}
