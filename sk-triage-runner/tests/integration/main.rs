// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests that drive fake stress testers through a real subprocess.

#![cfg(unix)]

mod fixtures;
mod run;
