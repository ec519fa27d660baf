// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observed failures and persisted baseline entries.

use crate::wildcard::WildcardPattern;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use sk_triage_metadata::BaselineEntrySummary;
use std::fmt;

/// The fields extracted from a single failure line.
///
/// Optional fields are `None` exactly when the corresponding part of the line was absent.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ParsedFailure {
    /// The failure category, e.g. `timed out` or `crashed`.
    pub failure_kind: String,

    /// The SourceKit request that failed.
    pub request: String,

    /// The refactoring action, if the request was a refactoring.
    pub refactoring: Option<String>,

    /// The file path, relative to the project cache.
    pub file: String,

    /// The character offset in the file.
    pub offset: Option<u64>,

    /// The length of the span at `offset`.
    pub length: Option<u64>,
}

/// One observed failure, stamped with the branch it was observed on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// The file path, relative to the project cache.
    pub file: String,

    /// The failure category.
    pub failure_kind: String,

    /// The SourceKit request that failed.
    pub request: String,

    /// The refactoring action, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refactoring: Option<String>,

    /// The character offset, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    /// The span length, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,

    /// The branches this record applies to.
    pub branches: Vec<String>,

    /// The issue reference copied from the matching baseline entry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl FailureRecord {
    /// Creates a record for a failure observed on `branch`.
    pub fn new(parsed: ParsedFailure, branch: &str) -> Self {
        let ParsedFailure {
            failure_kind,
            request,
            refactoring,
            file,
            offset,
            length,
        } = parsed;
        Self {
            file,
            failure_kind,
            request,
            refactoring,
            offset,
            length,
            branches: vec![branch.to_owned()],
            issue: None,
        }
    }

    /// Returns the stringified value of `field`, or `None` if the record doesn't have it.
    pub fn field_value(&self, field: EntryField) -> Option<String> {
        match field {
            EntryField::File => Some(self.file.clone()),
            EntryField::FailureKind => Some(self.failure_kind.clone()),
            EntryField::Request => Some(self.request.clone()),
            EntryField::Refactoring => self.refactoring.clone(),
            EntryField::Offset => self.offset.map(|offset| offset.to_string()),
            EntryField::Length => self.length.map(|length| length.to_string()),
        }
    }

    /// Converts this record into a literal baseline entry that matches it exactly.
    pub fn to_baseline_entry(&self) -> BaselineEntry {
        BaselineEntry {
            file: Some(WildcardPattern::new(self.file.as_str())),
            failure_kind: Some(WildcardPattern::new(self.failure_kind.as_str())),
            request: Some(WildcardPattern::new(self.request.as_str())),
            refactoring: self.refactoring.as_deref().map(WildcardPattern::new),
            offset: self.offset.map(|offset| WildcardPattern::new(offset.to_string())),
            length: self.length.map(|length| WildcardPattern::new(length.to_string())),
            branches: self.branches.clone(),
            issue: self.issue.clone(),
            matched: MatchedMarker,
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.request)?;
        if let Some(refactoring) = &self.refactoring {
            write!(f, "({refactoring}) ")?;
        }
        write!(f, "in {}", self.file)?;
        if let Some(offset) = self.offset {
            write!(f, ":{offset}")?;
            if let Some(length) = self.length {
                write!(f, "+{length}")?;
            }
        }
        write!(f, ": {}", self.failure_kind)
    }
}

/// The fields of a baseline entry that constrain a match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EntryField {
    /// `file`
    File,
    /// `failureKind`
    FailureKind,
    /// `request`
    Request,
    /// `refactoring`
    Refactoring,
    /// `offset`
    Offset,
    /// `length`
    Length,
}

impl EntryField {
    /// All fields that take part in matching, in serialization order.
    pub const ALL: [EntryField; 6] = [
        EntryField::File,
        EntryField::FailureKind,
        EntryField::Request,
        EntryField::Refactoring,
        EntryField::Offset,
        EntryField::Length,
    ];

    /// Returns the JSON key for this field.
    pub fn key(self) -> &'static str {
        match self {
            EntryField::File => "file",
            EntryField::FailureKind => "failureKind",
            EntryField::Request => "request",
            EntryField::Refactoring => "refactoring",
            EntryField::Offset => "offset",
            EntryField::Length => "length",
        }
    }
}

/// A persisted expected failure.
///
/// Every constraint is optional and may contain `*` wildcards. A missing constraint matches any
/// value. Field order here is the order of keys in written baselines, and `file` comes first so
/// that the derived ordering sorts by file.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BaselineEntry {
    /// The file pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<WildcardPattern>,

    /// The failure kind pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<WildcardPattern>,

    /// The request pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<WildcardPattern>,

    /// The refactoring pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refactoring: Option<WildcardPattern>,

    /// The offset pattern, matched against the decimal offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<WildcardPattern>,

    /// The length pattern, matched against the decimal length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<WildcardPattern>,

    /// The branches under which this entry is active.
    pub branches: Vec<String>,

    /// An external issue reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,

    #[serde(default, skip_serializing)]
    pub(crate) matched: MatchedMarker,
}

/// The per-run `matched` key that older tooling left in baselines. It's accepted with any value on
/// load, takes no part in comparisons, and is never written back.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub(crate) struct MatchedMarker;

impl<'de> Deserialize<'de> for MatchedMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(MatchedMarker)
    }
}

impl BaselineEntry {
    /// Returns the pattern for `field`, if this entry constrains it.
    pub fn constraint(&self, field: EntryField) -> Option<&WildcardPattern> {
        match field {
            EntryField::File => self.file.as_ref(),
            EntryField::FailureKind => self.failure_kind.as_ref(),
            EntryField::Request => self.request.as_ref(),
            EntryField::Refactoring => self.refactoring.as_ref(),
            EntryField::Offset => self.offset.as_ref(),
            EntryField::Length => self.length.as_ref(),
        }
    }

    /// Iterates over the constraints this entry sets.
    pub fn constraints(&self) -> impl Iterator<Item = (EntryField, &WildcardPattern)> + '_ {
        EntryField::ALL
            .into_iter()
            .filter_map(|field| self.constraint(field).map(|pattern| (field, pattern)))
    }

    /// Returns true if this entry is active on `branch`.
    pub fn applies_to(&self, branch: &str) -> bool {
        self.branches.iter().any(|b| b == branch)
    }

    /// Returns a serializable summary of this entry.
    pub fn to_summary(&self) -> BaselineEntrySummary {
        let pattern = |field| self.constraint(field).map(|p| p.as_str().to_owned());
        BaselineEntrySummary {
            file: pattern(EntryField::File),
            failure_kind: pattern(EntryField::FailureKind),
            request: pattern(EntryField::Request),
            refactoring: pattern(EntryField::Refactoring),
            offset: pattern(EntryField::Offset),
            length: pattern(EntryField::Length),
            issue: self.issue.clone(),
        }
    }
}

impl fmt::Display for BaselineEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, pattern) in self.constraints() {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", field.key(), pattern)?;
        }
        if first {
            f.write_str("(any failure)")?;
        }
        Ok(())
    }
}
