//! Flat `key=value` property files.
//!
//! Format: one binding per line, `#` starts a comment that runs to the end
//! of the line, keys and values are trimmed, blank lines are ignored. A
//! non-blank line without `=` is malformed.

use std::collections::BTreeMap;

use crate::error::{StoreError, StoreResult};

/// An ordered set of string properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse property text.
    pub fn parse(text: &str) -> StoreResult<Self> {
        Self::parse_with(text, |_, _| Ok(()))
    }

    /// Parse property text, rejecting any binding `check` refuses. The
    /// error carries the offending line number.
    pub fn parse_with(
        text: &str,
        check: impl Fn(&str, &str) -> Result<(), String>,
    ) -> StoreResult<Self> {
        let mut entries = BTreeMap::new();
        for (index, raw) in text.lines().enumerate() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| StoreError::MalformedReferences {
                    line: index + 1,
                    reason: format!("expected key=value, found {line:?}"),
                })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(StoreError::MalformedReferences {
                    line: index + 1,
                    reason: "empty key".into(),
                });
            }
            let value = value.trim();
            check(key, value).map_err(|reason| StoreError::MalformedReferences {
                line: index + 1,
                reason: format!("{key}: {reason}"),
            })?;
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    /// Render as property text, keys sorted.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let text = "# header\n\n  main = abc  \nfeature=def # trailing\n   \n";
        let props = Properties::parse(text).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("main"), Some("abc"));
        assert_eq!(props.get("feature"), Some("def"));
    }

    #[test]
    fn parse_rejects_lines_without_separator() {
        let err = Properties::parse("main=abc\ngarbage\n").unwrap_err();
        assert!(matches!(err, StoreError::MalformedReferences { line: 2, .. }));
    }

    #[test]
    fn render_is_sorted_and_reparses() {
        let mut props = Properties::new();
        props.set("zeta", "1");
        props.set("alpha", "2");
        let text = props.render();
        assert_eq!(text, "alpha=2\nzeta=1\n");
        assert_eq!(Properties::parse(&text).unwrap(), props);
    }

    #[test]
    fn parse_with_reports_refused_line() {
        let check = |_: &str, value: &str| {
            if value.chars().all(|c| c.is_ascii_digit()) {
                Ok(())
            } else {
                Err("not a number".to_string())
            }
        };
        assert!(Properties::parse_with("a=1\nb=2\n", check).is_ok());
        let err = Properties::parse_with("# c\na=1\nb=x\n", check).unwrap_err();
        assert!(matches!(err, StoreError::MalformedReferences { line: 3, .. }));
    }

    #[test]
    fn value_may_be_empty() {
        let props = Properties::parse("key=\n").unwrap();
        assert_eq!(props.get("key"), Some(""));
    }
}
