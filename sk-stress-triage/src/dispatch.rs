// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and routing.

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Subcommand};
use sk_triage_metadata::TriageExitCode;
use sk_triage_runner::{
    baseline::BaselineStore,
    config::{DefaultConfigWarnings, TriageConfig},
    report_writer,
    reporter::TriageReporter,
    runner::{RunDriver, TriageResults},
    summary::write_summary,
};
use std::{fs::File, io::BufReader};
use tracing::{info, warn};

/// Runs the SourceKit stress tester and triages its failures against a baseline of expected
/// failures.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct SkStressTriageApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl SkStressTriageApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let cwd = std::env::current_dir().map_err(ExpectedError::current_dir_invalid)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|error| ExpectedError::current_dir_invalid(error.into_io_error()))?;
        self.exec_in(&cwd, output, output_writer)
    }

    fn exec_in(
        self,
        cwd: &Utf8Path,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(cwd, output, output_writer),
            Command::Replay(opts) => opts.exec(cwd, output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the stress tester and triage its output
    ///
    /// The command to run is taken from `stress-tester.program` in the config, or from the
    /// arguments after `--`. Its stdout and stderr are merged and triaged line by line.
    Run(RunOpts),

    /// Triage a saved stress tester transcript
    ///
    /// The transcript is triaged as if it came from a stress tester that exited successfully.
    Replay(ReplayOpts),
}

#[derive(Debug, Args)]
struct RunOpts {
    #[clap(flatten)]
    triage: TriageOpts,

    /// Working directory for the stress tester [default: current directory]
    #[arg(long, value_name = "DIR")]
    dir: Option<Utf8PathBuf>,

    /// The command to run, overriding the config
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl RunOpts {
    fn exec(
        self,
        cwd: &Utf8Path,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let app = TriageApp::new(cwd, self.triage)?;
        let dir = self.dir.map(|dir| cwd.join(dir));
        let command = app
            .config
            .stress_tester()
            .command(&self.command, dir.as_deref())
            .ok_or(ExpectedError::NoStressTesterCommand)?;

        let driver = RunDriver::new(app.load_baseline()?, app.reporter(output));
        let results = driver.run(&command, output_writer.stdout_writer())?;
        app.finish(&results)
    }
}

#[derive(Debug, Args)]
struct ReplayOpts {
    #[clap(flatten)]
    triage: TriageOpts,

    /// The transcript to triage, or `-` for standard input
    #[arg(long, value_name = "PATH", default_value = "-")]
    log: Utf8PathBuf,
}

impl ReplayOpts {
    fn exec(
        self,
        cwd: &Utf8Path,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let app = TriageApp::new(cwd, self.triage)?;
        let driver = RunDriver::new(app.load_baseline()?, app.reporter(output));

        let results = if self.log == "-" {
            driver.drive_lines(
                std::io::stdin().lock(),
                "standard input",
                output_writer.stdout_writer(),
            )?
        } else {
            let path = cwd.join(&self.log);
            let file =
                File::open(&path).map_err(|error| ExpectedError::replay_log_open(path, error))?;
            driver.drive_lines(
                BufReader::new(file),
                self.log.as_str(),
                output_writer.stdout_writer(),
            )?
        };
        app.finish(&results)
    }
}

/// Options shared by every triage command.
#[derive(Debug, Args)]
#[command(next_help_heading = "Triage options")]
struct TriageOpts {
    /// The branch under test; only baseline entries for this branch apply
    #[arg(long, short, env = "SK_TRIAGE_BRANCH")]
    branch: String,

    /// The baseline of expected failures [default: from config]
    #[arg(long, value_name = "PATH", env = "SK_TRIAGE_BASELINE")]
    baseline: Option<Utf8PathBuf>,

    /// Write a regenerated baseline to this path [default: from config]
    ///
    /// The regenerated baseline is only written if the compat run passed.
    #[arg(long, value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    /// Keep every loaded baseline entry in the regenerated baseline
    #[arg(long)]
    promote: bool,

    /// Write a machine-readable summary of the run to this path
    #[arg(long, value_name = "PATH")]
    summary_json: Option<Utf8PathBuf>,

    /// Config file [default: .config/sk-triage.toml if it exists]
    #[arg(long, value_name = "PATH", env = "SK_TRIAGE_CONFIG_FILE")]
    config_file: Option<Utf8PathBuf>,
}

/// Settings resolved from the command line and the config.
#[derive(Debug)]
struct TriageApp {
    cwd: Utf8PathBuf,
    opts: TriageOpts,
    config: TriageConfig,
}

impl TriageApp {
    fn new(cwd: &Utf8Path, opts: TriageOpts) -> Result<Self> {
        let config_file = opts.config_file.as_ref().map(|file| cwd.join(file));
        let config =
            TriageConfig::from_sources(cwd, config_file.as_deref(), &mut DefaultConfigWarnings)?;
        Ok(Self {
            cwd: cwd.to_owned(),
            opts,
            config,
        })
    }

    fn baseline_path(&self) -> Utf8PathBuf {
        let baseline = self
            .opts
            .baseline
            .as_deref()
            .unwrap_or_else(|| self.config.triage().baseline());
        self.cwd.join(baseline)
    }

    fn output_path(&self) -> Option<Utf8PathBuf> {
        self.opts
            .output
            .as_deref()
            .or_else(|| self.config.triage().output())
            .map(|output| self.cwd.join(output))
    }

    fn promote(&self) -> bool {
        self.opts.promote || self.config.triage().promote()
    }

    fn load_baseline(&self) -> Result<BaselineStore> {
        Ok(BaselineStore::load(
            &self.baseline_path(),
            &self.opts.branch,
        )?)
    }

    fn reporter(&self, output: OutputContext) -> TriageReporter {
        let mut reporter = TriageReporter::new(output.verbose);
        if output.colorize_stdout() {
            reporter.colorize();
        }
        reporter
    }

    fn finish(&self, results: &TriageResults) -> Result<i32> {
        if let Some(summary_json) = &self.opts.summary_json {
            write_summary(&self.cwd.join(summary_json), &results.to_summary())?;
        }

        if let Some(output_path) = self.output_path() {
            if results.compat_run_failed() {
                warn!("compat run failed, not writing regenerated baseline to `{output_path}`");
            } else {
                let entries = report_writer::select_entries(results.aggregator(), self.promote());
                report_writer::write(&output_path, &entries)?;
                info!("wrote regenerated baseline to `{output_path}`");
            }
        }

        if results.verdict().is_pass() {
            Ok(TriageExitCode::OK)
        } else {
            Err(ExpectedError::triage_failed())
        }
    }
}
