use std::path::Path;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Settings that drive preprocessing and parsing of a script.
///
/// Read from TOML, e.g.:
///
/// ```toml
/// dialect = "mssql"
/// placeholder = "a"
/// stop_patterns = ['@', 'WITH\s+\(\s*NOLOCK\s*\)', '\(\s*NOLOCK\s*\)']
/// stop_functions = ["IIF"]
/// ```
///
/// Missing keys fall back to [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Dialect name understood by `sqlparser::dialect::dialect_from_str`.
    pub dialect: String,
    /// Identifier substituted for every erased stop-function call.
    pub placeholder: String,
    /// Regular expressions deleted from every line, applied in order.
    /// A broader pattern must come before any narrower pattern it contains.
    pub stop_patterns: Vec<String>,
    /// Functions the grammar cannot parse; their calls are erased.
    pub stop_functions: Vec<String>,
}

impl Default for Config {
    /// T-SQL preset: variable sigils and `NOLOCK` hints are dropped, `IIF` is erased.
    fn default() -> Self {
        Self {
            dialect: "mssql".to_owned(),
            placeholder: "a".to_owned(),
            stop_patterns: vec![
                "@".to_owned(),
                r"WITH\s+\(\s*NOLOCK\s*\)".to_owned(),
                r"\(\s*NOLOCK\s*\)".to_owned(),
            ],
            stop_functions: vec!["IIF".to_owned()],
        }
    }
}

impl Config {
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str)
            .map_err(|err| anyhow!("Failed to parse config due to error: {}", err))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| anyhow!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .map_err(|err| anyhow!("Invalid config in file {}: {}", path.display(), err))
    }
}
