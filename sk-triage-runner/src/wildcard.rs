// Copyright (c) The sk-triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wildcard patterns used by baseline entries.
//!
//! A pattern is a literal string in which `*` stands for any sequence of characters, including
//! `/`. Patterns are anchored to the **end** of the text they are matched against, but not to the
//! start: `foo` matches both `foo` and `xfoo`, but not `foox`. Baselines in the wild rely on this,
//! so it is preserved.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{cmp::Ordering, fmt, hash};

/// Returns true if `pattern` matches `text`.
///
/// For repeated matching, construct a [`WildcardPattern`] once instead.
pub fn matches(pattern: &str, text: &str) -> bool {
    WildcardPattern::new(pattern).is_match(text)
}

/// A compiled wildcard pattern.
///
/// Equality, ordering and hashing all use the source string.
#[derive(Clone)]
pub struct WildcardPattern {
    source: String,
    // None for the empty pattern, which only matches the empty string.
    regex: Option<Regex>,
}

impl WildcardPattern {
    /// Compiles a new pattern.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = if source.is_empty() {
            None
        } else {
            let mut re = source.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
            re.push('$');
            Some(Regex::new(&re).expect("escaped wildcard segments always form a valid regex"))
        };
        Self { source, regex }
    }

    /// Returns the pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if this pattern matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(text),
            None => text.is_empty(),
        }
    }
}

impl fmt::Debug for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WildcardPattern").field(&self.source).finish()
    }
}

impl fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for WildcardPattern {}

impl PartialOrd for WildcardPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WildcardPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source.cmp(&other.source)
    }
}

impl hash::Hash for WildcardPattern {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl From<&str> for WildcardPattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for WildcardPattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl Serialize for WildcardPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for WildcardPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PatternVisitor;

        impl de::Visitor<'_> for PatternVisitor {
            type Value = WildcardPattern;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a wildcard pattern string or a non-negative integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(WildcardPattern::new(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(WildcardPattern::new(v))
            }

            // Older baselines store offsets and lengths as JSON numbers.
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(WildcardPattern::new(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                if v < 0 {
                    return Err(E::invalid_value(de::Unexpected::Signed(v), &self));
                }
                Ok(WildcardPattern::new(v.to_string()))
            }
        }

        deserializer.deserialize_any(PatternVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use test_strategy::proptest;

    #[test_case("*.swift", "a/b/c.swift", true ; "leading wildcard spans directories")]
    #[test_case("foo", "xfoo", true ; "not anchored at start")]
    #[test_case("foo", "foox", false ; "anchored at end")]
    #[test_case("foo", "foo", true ; "exact")]
    #[test_case("Sources/*/Bar.swift", "Pkg/Sources/A/B/Bar.swift", true ; "inner wildcard")]
    #[test_case("Sources/*/Bar.swift", "Sources/Baz.swift", false ; "inner wildcard needs separator")]
    #[test_case("a.swift", "abswift", false ; "dot is literal")]
    #[test_case("(x)+", "(x)+", true ; "regex metacharacters are literal")]
    #[test_case("Foo", "foo", false ; "case sensitive")]
    #[test_case("*", "", true ; "star matches empty")]
    #[test_case("*", "anything/at/all", true ; "star matches anything")]
    #[test_case("", "", true ; "empty matches empty")]
    #[test_case("", "x", false ; "empty does not match non-empty")]
    #[test_case("1*", "123", true ; "stringified number prefix")]
    fn wildcard_matches(pattern: &str, text: &str, expected: bool) {
        assert_eq!(
            matches(pattern, text),
            expected,
            "pattern {pattern:?} against {text:?}"
        );
    }

    #[test]
    fn deserialize_accepts_strings_and_integers() {
        let patterns: Vec<WildcardPattern> =
            serde_json::from_str(r#"["Foo*.swift", 42, "7"]"#).unwrap();
        let sources: Vec<_> = patterns.iter().map(|p| p.as_str()).collect();
        assert_eq!(sources, ["Foo*.swift", "42", "7"]);

        serde_json::from_str::<WildcardPattern>("-1").unwrap_err();
        serde_json::from_str::<WildcardPattern>("true").unwrap_err();
    }

    #[test]
    fn serializes_as_source() {
        let pattern = WildcardPattern::new("dir/*");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), r#""dir/*""#);
    }

    #[proptest(cases = 256)]
    fn literal_pattern_matches_any_prefixed_text(
        #[strategy("[a-z/]{0,8}")] prefix: String,
        #[strategy("[a-zA-Z0-9./()+?^$|]{1,16}")] literal: String,
    ) {
        let text = format!("{prefix}{literal}");
        assert!(matches(&literal, &text), "{literal:?} against {text:?}");
    }

    #[proptest(cases = 256)]
    fn literal_pattern_rejects_extra_suffix(
        #[strategy("[a-zA-Z0-9./]{1,16}")] literal: String,
        #[strategy("[#@]{1,4}")] suffix: String,
    ) {
        let text = format!("{literal}{suffix}");
        assert!(!matches(&literal, &text), "{literal:?} against {text:?}");
    }
}
