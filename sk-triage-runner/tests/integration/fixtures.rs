// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Result, eyre};
use indexmap::IndexMap;
use sk_triage_runner::{
    baseline::BaselineStore,
    reporter::TriageReporter,
    runner::{RunDriver, StressTesterCommand, StressTesterEnv, TriageResults},
};
use std::fs;
use tempfile::TempDir;

pub(crate) const BRANCH: &str = "main";

/// A scratch directory holding a fake stress tester script and a baseline.
pub(crate) struct Fixture {
    // Held for the lifetime of the fixture.
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    pub(crate) fn new(script: &str, baseline: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned())
            .map_err(|path| eyre!("temp dir {} is not UTF-8", path.display()))?;
        fs::write(root.join("stress.sh"), script)?;
        fs::write(root.join("baseline.json"), baseline)?;
        Ok(Self { _dir: dir, root })
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(crate) fn baseline_path(&self) -> Utf8PathBuf {
        self.root.join("baseline.json")
    }

    pub(crate) fn command(&self, inherit_env: bool) -> StressTesterCommand {
        StressTesterCommand {
            program: "/bin/sh".to_owned(),
            args: vec!["stress.sh".to_owned()],
            dir: Some(self.root.clone()),
            env: StressTesterEnv {
                stress_tester_path: "/opt/bin/sk-stress-test".into(),
                swiftc_path: "/opt/bin/swiftc".into(),
                codecomplete_limit: 50,
                silent: false,
                extra: IndexMap::from([("SK_TRIAGE_FIXTURE".to_owned(), "1".to_owned())]),
                inherit_env,
            },
        }
    }

    /// Runs the fake stress tester, returning the results and the transcript.
    pub(crate) fn run(&self, command: &StressTesterCommand) -> Result<(TriageResults, String)> {
        let store = BaselineStore::load(&self.baseline_path(), BRANCH)?;
        let driver = RunDriver::new(store, TriageReporter::new(true));
        let mut transcript = Vec::new();
        let results = driver.run(command, &mut transcript)?;
        Ok((results, String::from_utf8(transcript)?))
    }
}

pub(crate) fn failure_line(kind: &str, file: &str) -> String {
    format!(
        "[sk-stress-test] error: {kind} invoking SourceKit request CursorInfo on /tmp/work/project_cache/{file} at offset 12 with args: [\"-sdk\"]"
    )
}

pub(crate) fn progress_line(file: &str) -> String {
    format!("[sk-stress-test] Stress testing /tmp/work/project_cache/{file}:")
}
