//! The `mo` option set.

use std::collections::BTreeSet;
use std::fmt;

/// A set of free-form option flags such as `fit`, `errcode`, `ascale` or `info`.
///
/// Flags are matched by exact string comparison. Iteration and display order
/// is lexical, so two sets with the same members always serialize the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    flags: BTreeSet<String>,
}

impl OptionSet {
    /// Create an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated flag list. Empty items are dropped.
    pub fn parse(text: &str) -> Self {
        let flags = text
            .split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(str::to_string)
            .collect();
        Self { flags }
    }

    /// Add a flag. Returns `false` if it was already present.
    pub fn insert(&mut self, flag: impl Into<String>) -> bool {
        self.flags.insert(flag.into())
    }

    /// Remove a flag. Returns `true` if it was present.
    pub fn remove(&mut self, flag: &str) -> bool {
        self.flags.remove(flag)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in &self.flags {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(flag)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for OptionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().map(Into::into).collect(),
        }
    }
}
