use std::fmt::Display;

use serde::Deserialize;

pub const EXTRACTION_TESTS_FILE: &str = "tests/extraction_tests.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct TestExtraction {
    pub name: String,
    pub sql: String,
    pub tables: Vec<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub statements: Option<usize>,
    #[serde(default)]
    pub dialect: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TestExtractionData {
    pub tests: Vec<TestExtraction>,
}

impl Display for TestExtractionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
