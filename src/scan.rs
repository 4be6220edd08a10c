use serde::Serialize;

use crate::{
    config::Config,
    extractor::{JoinNames, extract_joins},
    parser::{Diagnostic, GrammarParser, ResilientParser, SqlGrammar},
    preprocessing::Preprocessor,
};

/// Outcome of scanning one script.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanReport {
    /// Candidate statements cut out of the normalized script.
    pub statements: Vec<String>,
    pub joins: JoinNames,
    /// Candidates dropped because they could not be parsed as SELECTs.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the whole pipeline: preprocessing, parsing and join extraction.
///
/// Every scan starts from a fresh preprocessing state, so one scanner can be
/// reused for any number of scripts.
pub struct JoinScanner<G = SqlGrammar> {
    preprocessor: Preprocessor,
    parser: ResilientParser<G>,
}

impl JoinScanner<SqlGrammar> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            Preprocessor::from_config(config)?,
            ResilientParser::new(SqlGrammar::from_dialect_name(&config.dialect)?),
        ))
    }
}

impl<G: GrammarParser> JoinScanner<G> {
    pub fn new(preprocessor: Preprocessor, parser: ResilientParser<G>) -> Self {
        Self {
            preprocessor,
            parser,
        }
    }

    pub fn scan_lines<'a, I>(&self, lines: I) -> ScanReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let script = self.preprocessor.normalize(lines);
        let statements = script.statements();
        log::info!("Found {} statements with joins.", statements.len());

        let mut diagnostics: Vec<Diagnostic> = script
            .lines_with_unmatched_join()
            .into_iter()
            .map(|line| {
                log::warn!("No SELECT found before JOIN:\n{}", line);
                Diagnostic::UnmatchedJoin {
                    line: line.to_owned(),
                }
            })
            .collect();

        let parsed = self.parser.parse(&statements);
        let joins = extract_joins(&parsed.selects);
        log::info!(
            "Extracted {} tables and {} columns from {} selects ({} statements dropped).",
            joins.table_names.len(),
            joins.column_names.len(),
            parsed.selects.len(),
            parsed.diagnostics.len()
        );
        diagnostics.extend(parsed.diagnostics);

        ScanReport {
            statements,
            joins,
            diagnostics,
        }
    }

    pub fn scan_script(&self, script: &str) -> ScanReport {
        self.scan_lines(script.lines())
    }
}
