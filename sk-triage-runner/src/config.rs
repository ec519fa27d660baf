// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for triage runs.
//!
//! Configuration is layered: the defaults in `default-config.toml` are embedded in the binary, and
//! a TOML file (by default [`TriageConfig::CONFIG_PATH`]) is merged on top.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    runner::{StressTesterCommand, StressTesterEnv},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Trait for handling warnings produced while loading configuration.
pub trait ConfigWarnings {
    /// Called when unknown configuration keys are found.
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>);
}

/// Default implementation of [`ConfigWarnings`] that logs warnings via [`tracing`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(&mut self, config_file: &Utf8Path, unknown: &BTreeSet<String>) {
        let mut unknown_str = String::new();
        if unknown.len() == 1 {
            // Print this on the same line.
            unknown_str.push(' ');
            unknown_str.push_str(unknown.iter().next().map_or("", String::as_str));
        } else {
            for ignored_key in unknown {
                unknown_str.push('\n');
                unknown_str.push_str("  - ");
                unknown_str.push_str(ignored_key);
            }
        }

        warn!("ignoring unknown configuration keys in config file {config_file}:{unknown_str}");
    }
}

/// Triage configuration, after merging defaults with a config file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageConfig {
    stress_tester: StressTesterConfig,
    triage: TriageSettings,
}

impl TriageConfig {
    /// The default location of the config file, relative to the working directory.
    pub const CONFIG_PATH: &'static str = ".config/sk-triage.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config, with defaults layered underneath.
    ///
    /// If `config_file` is `None`, [`Self::CONFIG_PATH`] is read relative to `cwd` if it exists.
    /// If it is `Some`, the file must exist.
    pub fn from_sources(
        cwd: &Utf8Path,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = cwd.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };
        debug!("loading config, file: {config_file}");

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &unknown);
        }

        config
            .validate()
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;
        Ok(config)
    }

    /// Returns the default config, without reading any files.
    pub fn default_config() -> Self {
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        config
    }

    /// Returns the stress tester settings.
    pub fn stress_tester(&self) -> &StressTesterConfig {
        &self.stress_tester
    }

    /// Returns the triage settings.
    pub fn triage(&self) -> &TriageSettings {
        &self.triage
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    // This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: TriageConfig = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            let path = error.path().to_string();
            // The config crate may also report the key; drop it for consistency.
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError { path, error }
        })?;

        Ok((config, ignored))
    }

    fn validate(&self) -> Result<(), ConfigParseErrorKind> {
        if self
            .stress_tester
            .program
            .as_deref()
            .is_some_and(|program| program.is_empty())
        {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "stress-tester.program",
                message: "must not be empty".to_owned(),
            });
        }
        if let Some(key) = self
            .stress_tester
            .env
            .keys()
            .find(|key| key.is_empty() || key.contains('='))
        {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "stress-tester.env",
                message: format!("`{key}` is not a valid environment variable name"),
            });
        }
        if self.triage.baseline.as_str().is_empty() {
            return Err(ConfigParseErrorKind::InvalidValue {
                key: "triage.baseline",
                message: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Settings for running the stress tester.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StressTesterConfig {
    #[serde(default)]
    program: Option<String>,
    args: Vec<String>,
    stress_tester_path: Utf8PathBuf,
    swiftc_path: Utf8PathBuf,
    codecomplete_limit: u32,
    silent: bool,
    inherit_env: bool,
    #[serde(default)]
    env: IndexMap<String, String>,
}

impl StressTesterConfig {
    /// Returns the configured program, if any.
    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Returns the configured arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the environment contract described by this config.
    pub fn env(&self) -> StressTesterEnv {
        StressTesterEnv {
            stress_tester_path: self.stress_tester_path.clone(),
            swiftc_path: self.swiftc_path.clone(),
            codecomplete_limit: self.codecomplete_limit,
            silent: self.silent,
            extra: self.env.clone(),
            inherit_env: self.inherit_env,
        }
    }

    /// Builds a command from this config.
    ///
    /// If `command_line` is non-empty, its first element replaces the configured program and the
    /// rest replace the configured arguments. Returns `None` if no program is available.
    pub fn command(
        &self,
        command_line: &[String],
        dir: Option<&Utf8Path>,
    ) -> Option<StressTesterCommand> {
        let (program, args) = match command_line.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (self.program.clone()?, self.args.clone()),
        };
        Some(StressTesterCommand {
            program,
            args,
            dir: dir.map(Utf8Path::to_owned),
            env: self.env(),
        })
    }
}

/// Settings for baseline input and output.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriageSettings {
    baseline: Utf8PathBuf,
    #[serde(default)]
    output: Option<Utf8PathBuf>,
    promote: bool,
}

impl TriageSettings {
    /// Returns the path to the baseline.
    pub fn baseline(&self) -> &Utf8Path {
        &self.baseline
    }

    /// Returns where to write the regenerated baseline, if anywhere.
    pub fn output(&self) -> Option<&Utf8Path> {
        self.output.as_deref()
    }

    /// Returns true if the regenerated baseline keeps all loaded entries.
    pub fn promote(&self) -> bool {
        self.promote
    }
}
