//! Regex-based list filtering.
//!
//! Search text typed into a filter control is compiled into a
//! case-insensitive regular expression. While the user is typing, the text
//! is often not a valid pattern yet (`heart(`, `[a-`), so an invalid pattern
//! matches everything instead of blanking the list.
//!
//! Patterns use the [`regex`] crate syntax, which has no lookaround
//! (`(?=`, `(?!`, `(?<=`, `(?<!`) and no backreferences (`\1`). Such patterns
//! are rejected at compile time and therefore also match everything.

use regex::{Regex, RegexBuilder};

/// Compile search text into a matcher.
///
/// Returns `None` when the trimmed text is empty or is not a valid regular
/// expression, lookaround and backreferences included. `None` means "match
/// everything".
pub fn compile(query: &str) -> Option<Regex> {
    let q = query.trim();
    if q.is_empty() {
        return None;
    }
    RegexBuilder::new(q).case_insensitive(true).build().ok()
}

/// A compiled search filter.
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    matcher: Option<Regex>,
}

impl PatternFilter {
    pub fn new(query: &str) -> Self {
        Self {
            matcher: compile(query),
        }
    }

    /// Test a candidate string. Always true when there is no matcher.
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.as_ref().map_or(true, |re| re.is_match(candidate))
    }

    /// Returns true if the filter actually restricts anything.
    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }

    /// Keep the items whose key matches, in their original order.
    pub fn apply<'a, T, F>(&self, items: &'a [T], key: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        items.iter().filter(|item| self.matches(key(item))).collect()
    }
}

/// Filter `items` by `query`, testing the string returned by `key`.
pub fn filter_by<'a, T, F>(items: &'a [T], query: &str, key: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    PatternFilter::new(query).apply(items, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Vec<String> {
        ["heart-rate", "blood-pressure", "Mood", "spo2", "HeartSound"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn names<'a>(items: Vec<&'a String>) -> Vec<&'a str> {
        items.into_iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn empty_query_is_identity() {
        let items = props();
        for q in ["", "   ", "\t\n"] {
            assert_eq!(filter_by(&items, q, |s| s.as_str()).len(), items.len());
        }
    }

    #[test]
    fn matches_case_insensitively() {
        let items = props();
        assert_eq!(names(filter_by(&items, "heart", |s| s.as_str())), vec!["heart-rate", "HeartSound"]);
        assert_eq!(names(filter_by(&items, "MOOD", |s| s.as_str())), vec!["Mood"]);
    }

    #[test]
    fn regex_syntax_is_honoured() {
        let items = props();
        assert_eq!(names(filter_by(&items, "^b.*e$", |s| s.as_str())), vec!["blood-pressure"]);
        assert_eq!(names(filter_by(&items, r"\d", |s| s.as_str())), vec!["spo2"]);
    }

    #[test]
    fn query_is_trimmed_before_compiling() {
        let items = props();
        assert_eq!(names(filter_by(&items, "  spo2  ", |s| s.as_str())), vec!["spo2"]);
    }

    #[test]
    fn invalid_pattern_fails_open() {
        let items = props();
        for q in ["heart(", "[a-", "*", "(?<"] {
            assert!(compile(q).is_none(), "{q} should not compile");
            assert_eq!(filter_by(&items, q, |s| s.as_str()).len(), items.len());
        }
    }

    #[test]
    fn lookaround_and_backreferences_fail_open() {
        let items = props();
        for q in ["^(?!heart)", "rate(?=$)", "(?<=blood-)pressure", r"(o)\1"] {
            assert!(compile(q).is_none(), "{q} should not compile");
            assert!(!PatternFilter::new(q).is_active());
            assert_eq!(filter_by(&items, q, |s| s.as_str()).len(), items.len());
        }
    }

    #[test]
    fn no_match_yields_empty() {
        let items = props();
        assert!(filter_by(&items, "temperature", |s| s.as_str()).is_empty());
    }

    #[test]
    fn filter_reports_activity() {
        assert!(!PatternFilter::new("").is_active());
        assert!(!PatternFilter::new("(").is_active());
        assert!(PatternFilter::new("bpm").is_active());
    }
}
