use std::sync::LazyLock;

use anyhow::anyhow;
use regex::{Regex, RegexBuilder};

static CROSS_APPLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CROSS\s+APPLY").expect("valid CROSS APPLY pattern"));

/// Line-level rewriting of dialect-only syntax.
///
/// Stop-patterns are deleted in the order they were given: if a pattern is a
/// substring of another one (`(NOLOCK)` and `WITH (NOLOCK)`), the longer one has
/// to come first or a dangling keyword is left behind.
pub struct DialectNormalizer {
    stop_patterns: Vec<Regex>,
}

impl DialectNormalizer {
    pub fn new<S: AsRef<str>>(stop_patterns: &[S]) -> anyhow::Result<Self> {
        let stop_patterns = stop_patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| anyhow!("Invalid stop pattern `{}`: {}", pattern, err))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { stop_patterns })
    }

    pub fn strip_stop_patterns(&self, line: &str) -> String {
        self.stop_patterns
            .iter()
            .fold(line.to_owned(), |line, pattern| {
                pattern.replace_all(&line, "").into_owned()
            })
    }

    /// Quotes are unified to `"` and `CROSS APPLY` becomes a plain `JOIN`.
    pub fn rewrite(line: &str) -> String {
        let line = line.replace('\'', "\"");
        CROSS_APPLY.replace_all(&line, "JOIN").into_owned()
    }

    pub fn normalize_line(&self, line: &str) -> String {
        Self::rewrite(&self.strip_stop_patterns(line))
    }
}
