// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use sk_triage_metadata::TriageVerdict;
use sk_triage_runner::{
    baseline::BaselineStore, errors::RunnerError, report_writer, reporter::TriageReporter,
    runner::RunDriver,
};
use std::fmt::Write;

fn script(lines: &[String], exit: &str) -> String {
    let mut script = String::new();
    for (index, line) in lines.iter().enumerate() {
        // Alternate streams so that interleaving is exercised.
        let redirect = if index % 2 == 0 { "" } else { " 1>&2" };
        writeln!(script, "printf '%s\\n' '{line}'{redirect}").unwrap();
    }
    writeln!(script, "{exit}").unwrap();
    script
}

#[test]
fn expected_failure_passes() -> Result<()> {
    let fixture = Fixture::new(
        &script(
            &[
                progress_line("Pkg/Foo.swift"),
                failure_line("crash", "Pkg/Foo.swift"),
            ],
            "exit 0",
        ),
        r#"[{"file": "Foo.swift", "failureKind": "crash", "branches": ["main"], "issue": "SR-1"}]"#,
    )?;

    let (results, transcript) = fixture.run(&fixture.command(true))?;
    assert_eq!(results.aggregator().expected().len(), 1);
    assert!(results.aggregator().unexpected().is_empty());
    assert!(!results.compat_run_failed());
    assert_eq!(results.verdict(), TriageVerdict::Pass);
    ensure!(
        transcript.contains("[XFAIL: SR-1] [sk-stress-test] error: crash"),
        "transcript annotates the expected failure:\n{transcript}"
    );
    Ok(())
}

#[test]
fn lines_are_processed_in_emission_order() -> Result<()> {
    let lines = vec![
        failure_line("first", "A.swift"),
        failure_line("second", "B.swift"),
        failure_line("third", "C.swift"),
        failure_line("fourth", "D.swift"),
    ];
    let fixture = Fixture::new(&script(&lines, "exit 0"), "[]")?;

    let (results, _) = fixture.run(&fixture.command(true))?;
    let kinds: Vec<_> = results
        .aggregator()
        .unexpected()
        .iter()
        .map(|record| record.failure_kind.as_str())
        .collect();
    assert_eq!(kinds, ["first", "second", "third", "fourth"]);
    Ok(())
}

#[test]
fn non_zero_exit_fails_the_run() -> Result<()> {
    let fixture = Fixture::new(
        &script(
            &[
                progress_line("Pkg/Seen.swift"),
                failure_line("crash", "Pkg/Foo.swift"),
            ],
            "exit 3",
        ),
        r#"[
            {"file": "Pkg/Foo.swift", "branches": ["main"]},
            {"file": "Pkg/Seen.swift", "branches": ["main"]}
        ]"#,
    )?;

    let (results, transcript) = fixture.run(&fixture.command(true))?;
    // Lines seen before the exit are still classified.
    assert_eq!(results.aggregator().expected().len(), 1);
    assert!(results.compat_run_failed());
    assert_eq!(results.exit_description(), Some("exited with exit code 3"));
    assert_eq!(results.verdict(), TriageVerdict::Fail);

    let summary = results.to_summary();
    assert_eq!(summary.unmatched_count, None);
    assert!(summary.unmatched.is_empty());
    ensure!(
        !transcript.contains("Unmatched"),
        "unmatched count is not reported for a failed run:\n{transcript}"
    );
    Ok(())
}

#[test]
fn death_by_signal_fails_the_run() -> Result<()> {
    let fixture = Fixture::new(&script(&[], "kill -9 $$"), "[]")?;
    let (results, _) = fixture.run(&fixture.command(true))?;
    assert!(results.compat_run_failed());
    assert_eq!(
        results.exit_description(),
        Some("aborted with signal 9 (SIGKILL)")
    );
    Ok(())
}

#[test]
fn environment_contract() -> Result<()> {
    let fixture = Fixture::new(
        "echo \"test=$SK_STRESS_TEST swiftc=$SK_STRESS_SWIFTC limit=$SK_STRESS_CODECOMPLETE_LIMIT silent=$SK_STRESS_SILENT extra=$SK_TRIAGE_FIXTURE home=${HOME:-unset}\"\n",
        "[]",
    )?;
    let expected = "test=/opt/bin/sk-stress-test swiftc=/opt/bin/swiftc limit=50 silent=false extra=1";

    let home_set = std::env::var_os("HOME").is_some();

    let (_, transcript) = fixture.run(&fixture.command(false))?;
    ensure!(
        transcript.contains(&format!("{expected} home=unset")),
        "only the contract is passed without inheritance:\n{transcript}"
    );
    ensure!(
        transcript.contains("(no other environment variables)"),
        "verbose transcript notes the cleared environment:\n{transcript}"
    );

    let (_, transcript) = fixture.run(&fixture.command(true))?;
    ensure!(
        transcript.contains(expected),
        "contract is passed with inheritance:\n{transcript}"
    );
    if home_set {
        ensure!(
            !transcript.contains("home=unset"),
            "ambient environment is inherited:\n{transcript}"
        );
    }
    Ok(())
}

#[test]
fn spawn_failure_is_an_error() -> Result<()> {
    let fixture = Fixture::new("", "[]")?;
    let mut command = fixture.command(true);
    command.program = fixture.root().join("does-not-exist").into_string();

    let store = BaselineStore::load(&fixture.baseline_path(), BRANCH)?;
    let driver = RunDriver::new(store, TriageReporter::new(false));
    let err = driver.run(&command, std::io::sink()).unwrap_err();
    assert!(matches!(err, RunnerError::Exec { .. }), "{err:?}");
    Ok(())
}

#[test]
fn regenerated_baseline_round_trips() -> Result<()> {
    let fixture = Fixture::new(
        &script(
            &[
                failure_line("crash", "Pkg/Known.swift"),
                failure_line("timeout", "Pkg/New.swift"),
            ],
            "exit 0",
        ),
        r#"[{"file": "Known.swift", "branches": ["main"], "issue": "SR-7"}]"#,
    )?;
    let (results, _) = fixture.run(&fixture.command(true))?;
    assert_eq!(results.verdict(), TriageVerdict::Fail);

    let output = fixture.root().join("updated.json");
    let entries = report_writer::select_entries(results.aggregator(), false);
    report_writer::write(&output, &entries)?;

    // Rerunning against the regenerated baseline, every failure is expected.
    let store = BaselineStore::load(&output, BRANCH)?;
    assert_eq!(store.len(), 2);
    let driver = RunDriver::new(store, TriageReporter::new(false));
    let results = driver.run(&fixture.command(true), std::io::sink())?;
    assert_eq!(results.aggregator().expected().len(), 2);
    assert_eq!(results.verdict(), TriageVerdict::Pass);
    let issues: Vec<_> = results
        .aggregator()
        .expected()
        .iter()
        .map(|record| record.issue.as_deref())
        .collect();
    assert_eq!(issues, [Some("SR-7"), None]);
    Ok(())
}
