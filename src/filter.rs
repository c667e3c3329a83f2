//! Allow-list of entry patterns.

use regex::Regex;

use crate::error::Error;

/// Compiled regular expressions selecting which entries to extract.
///
/// An empty set selects everything. Otherwise an entry is selected when its
/// normalized path matches **any** pattern in the set.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    patterns: Vec<Regex>,
}

impl FilterSet {
    /// Compile every pattern. The first malformed pattern fails the whole set.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, Error> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(p).map_err(|source| Error::InvalidFilter {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether the entry at `path` (already normalized) should be extracted.
    pub fn selects(&self, path: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_selects_everything() {
        let filters = FilterSet::compile::<&str>(&[]).unwrap();
        assert!(filters.is_empty());
        assert!(filters.selects("anything/at/all"));
    }

    #[test]
    fn any_pattern_selects() {
        let filters = FilterSet::compile(&[r"\.txt$", r"^bin/"]).unwrap();
        assert_eq!(filters.len(), 2);
        assert!(filters.selects("a.txt"));
        assert!(filters.selects("bin/tool"));
        assert!(!filters.selects("b.bin"));
    }

    #[test]
    fn malformed_pattern_is_reported() {
        match FilterSet::compile(&["ok", "(unclosed"]) {
            Err(Error::InvalidFilter { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("expected InvalidFilter, got {:?}", other),
        }
    }
}
