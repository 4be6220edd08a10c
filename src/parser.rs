use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use serde::Serialize;
use sqlparser::ast::{Query, Select, SetExpr, Statement};
use sqlparser::dialect::{Dialect, dialect_from_str};
use sqlparser::parser::Parser;

static FOUND_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"found: (?P<lexeme>.+) at Line: (?P<line>\d+), Column: (?P<column>\d+)")
        .expect("valid parser error pattern")
});

/// Token the grammar stopped at. Line and column are 1-based, columns count chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureToken {
    pub lexeme: String,
    pub line: u64,
    pub column: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    pub message: String,
    pub failure_token: Option<FailureToken>,
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GrammarError {}

impl GrammarError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            failure_token: None,
        }
    }

    pub fn with_failure_token(mut self, failure_token: FailureToken) -> Self {
        self.failure_token = Some(failure_token);
        self
    }

    /// When the grammar failed on a `)`, the statement text before that bracket.
    fn cut_before_closing_bracket(&self, sql: &str) -> Option<String> {
        let token = self.failure_token.as_ref()?;
        if token.lexeme != ")" {
            return None;
        }
        let line_idx = usize::try_from(token.line.checked_sub(1)?).ok()?;
        let col_idx = usize::try_from(token.column.checked_sub(1)?).ok()?;

        let mut line_start = 0;
        for (idx, line) in sql.split('\n').enumerate() {
            if idx == line_idx {
                let (col_byte, _) = line.char_indices().nth(col_idx)?;
                let shortened = sql[..line_start + col_byte].trim_end();
                return (!shortened.is_empty()).then(|| shortened.to_owned());
            }
            line_start += line.len() + 1;
        }
        None
    }
}

/// The external SQL grammar.
pub trait GrammarParser {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, GrammarError>;
}

impl<G: GrammarParser + ?Sized> GrammarParser for &G {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, GrammarError> {
        (**self).parse(sql)
    }
}

/// [`GrammarParser`] backed by `sqlparser`.
pub struct SqlGrammar {
    dialect: Box<dyn Dialect>,
}

impl SqlGrammar {
    pub fn new(dialect: Box<dyn Dialect>) -> Self {
        Self { dialect }
    }

    pub fn from_dialect_name(name: &str) -> anyhow::Result<Self> {
        dialect_from_str(name)
            .map(Self::new)
            .ok_or_else(|| anyhow!("Unknown SQL dialect `{}`.", name))
    }
}

impl GrammarParser for SqlGrammar {
    fn parse(&self, sql: &str) -> Result<Vec<Statement>, GrammarError> {
        Parser::parse_sql(self.dialect.as_ref(), sql).map_err(|err| {
            let message = err.to_string();
            let failure_token = FOUND_AT.captures(&message).and_then(|caps| {
                Some(FailureToken {
                    lexeme: caps["lexeme"].to_owned(),
                    line: caps["line"].parse().ok()?,
                    column: caps["column"].parse().ok()?,
                })
            });
            GrammarError {
                message,
                failure_token,
            }
        })
    }
}

/// A candidate that did not make it into the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Unparseable {
        statement: String,
        error: String,
        retried: bool,
    },
    NotSelect {
        statement: String,
    },
    /// A `JOIN` with no SELECT before it, so no statement was cut around it.
    UnmatchedJoin {
        line: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Unparseable {
                statement,
                error,
                retried,
            } => {
                let retried = if *retried { " (after retry)" } else { "" };
                write!(f, "Could not parse statement{}: {}\n{}", retried, error, statement)
            }
            Diagnostic::NotSelect { statement } => {
                write!(f, "Statement was not recognized as a SELECT:\n{}", statement)
            }
            Diagnostic::UnmatchedJoin { line } => {
                write!(f, "No SELECT found before JOIN:\n{}", line)
            }
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ParsedSelects {
    pub selects: Vec<Select>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Collects the plain SELECTs of a query, expanding set operations left to right.
pub fn flatten_query(query: Query, selects: &mut Vec<Select>) {
    flatten_set_expr(*query.body, selects);
}

fn flatten_set_expr(body: SetExpr, selects: &mut Vec<Select>) {
    match body {
        SetExpr::Select(select) => selects.push(*select),
        SetExpr::SetOperation { left, right, .. } => {
            flatten_set_expr(*left, selects);
            flatten_set_expr(*right, selects);
        }
        SetExpr::Query(query) => flatten_query(*query, selects),
        _ => {}
    }
}

/// Parses candidate statements, recovering from candidates that swallowed the
/// closing bracket of an enclosing query.
pub struct ResilientParser<G> {
    grammar: G,
}

impl<G: GrammarParser> ResilientParser<G> {
    pub fn new(grammar: G) -> Self {
        Self { grammar }
    }

    pub fn parse<S: AsRef<str>>(&self, candidates: &[S]) -> ParsedSelects {
        let mut parsed = ParsedSelects::default();
        for candidate in candidates {
            self.parse_candidate(candidate.as_ref(), &mut parsed);
        }
        parsed
    }

    fn parse_candidate(&self, candidate: &str, parsed: &mut ParsedSelects) {
        let err = match self.grammar.parse(candidate) {
            Ok(statements) => return Self::accept(statements, candidate, parsed),
            Err(err) => err,
        };

        let Some(shortened) = err.cut_before_closing_bracket(candidate) else {
            Self::reject(candidate, &err, false, parsed);
            return;
        };
        log::debug!("Retrying statement cut before a closing bracket:\n{}", shortened);
        match self.grammar.parse(&shortened) {
            Ok(statements) => Self::accept(statements, &shortened, parsed),
            Err(retry_err) => Self::reject(&shortened, &retry_err, true, parsed),
        }
    }

    fn accept(statements: Vec<Statement>, sql: &str, parsed: &mut ParsedSelects) {
        if statements.is_empty() {
            log::warn!("Statement was not recognized:\n{}", sql);
            parsed.diagnostics.push(Diagnostic::NotSelect {
                statement: sql.to_owned(),
            });
        }
        for statement in statements {
            match statement {
                Statement::Query(query) => flatten_query(*query, &mut parsed.selects),
                other => {
                    log::warn!("Statement was not recognized as a SELECT:\n{}", other);
                    parsed.diagnostics.push(Diagnostic::NotSelect {
                        statement: other.to_string(),
                    });
                }
            }
        }
    }

    fn reject(sql: &str, err: &GrammarError, retried: bool, parsed: &mut ParsedSelects) {
        log::warn!("Could not parse statement due to: {}\n{}", err, sql);
        parsed.diagnostics.push(Diagnostic::Unparseable {
            statement: sql.to_owned(),
            error: err.message.clone(),
            retried,
        });
    }
}
