use std::sync::LazyLock;

use regex::Regex;

const JOIN_KEYWORD: &str = "JOIN";

static SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SELECT").expect("valid SELECT pattern"));
static STATEMENT_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n\s*\n|\sGO\s|\sUSE\s|\sCREATE\s").expect("valid statement end pattern")
});

/// A `[start, end)` byte range of a [`NormalizedScript`] expected to hold one
/// complete SELECT statement with at least one join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateStatement {
    pub start: usize,
    pub end: usize,
}

/// Normalized lines joined by `\n`, together with the offsets of every `JOIN`.
#[derive(Debug, Default, Clone)]
pub struct NormalizedScript {
    text: String,
    join_offsets: Vec<usize>,
}

impl NormalizedScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `line` plus a separator and returns the absolute offset the
    /// line starts at.
    pub fn push_line(&mut self, line: &str) -> usize {
        let line_start = self.text.len();
        self.join_offsets.extend(
            line.match_indices(JOIN_KEYWORD)
                .map(|(idx, _)| line_start + idx),
        );
        self.text.push_str(line);
        self.text.push('\n');
        line_start
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn join_offsets(&self) -> &[usize] {
        &self.join_offsets
    }

    pub fn statement(&self, candidate: CandidateStatement) -> &str {
        &self.text[candidate.start..candidate.end]
    }

    /// Texts of all [`NormalizedScript::candidates`].
    pub fn statements(&self) -> Vec<String> {
        self.candidates()
            .into_iter()
            .map(|candidate| self.statement(candidate).to_owned())
            .collect()
    }

    /// Lines holding a `JOIN` that no SELECT comes before, each line once.
    /// These joins never become part of a candidate.
    pub fn lines_with_unmatched_join(&self) -> Vec<&str> {
        let first_select = SELECT.find(&self.text).map_or(self.text.len(), |m| m.start());
        let mut lines: Vec<&str> = vec![];
        let mut last_line_start = None;
        for &join in self.join_offsets.iter().take_while(|&&join| join <= first_select) {
            let line_start = self.text[..join].rfind('\n').map_or(0, |idx| idx + 1);
            if last_line_start == Some(line_start) {
                continue;
            }
            last_line_start = Some(line_start);
            let line_end = self.text[join..]
                .find('\n')
                .map_or(self.text.len(), |idx| join + idx);
            lines.push(&self.text[line_start..line_end]);
        }
        lines
    }

    /// Locates the statement around every join.
    ///
    /// A statement starts at the closest SELECT before the join, unless the
    /// text between them closes more brackets than it opens: the SELECT then
    /// belongs to a subquery the join is not part of, and the search moves one
    /// SELECT further back. A statement ends at a blank line, at a `GO`, `USE`
    /// or `CREATE` keyword, or at the end of the script. Joins inside an already
    /// emitted statement are skipped.
    pub fn candidates(&self) -> Vec<CandidateStatement> {
        let selects: Vec<usize> = SELECT.find_iter(&self.text).map(|m| m.start()).collect();
        let last_select_before = |offset: usize| {
            let idx = selects.partition_point(|&start| start < offset);
            idx.checked_sub(1).map(|idx| selects[idx])
        };

        let mut candidates = vec![];
        let mut end_of_last = 0;
        for &join in &self.join_offsets {
            let Some(mut start) = last_select_before(join) else {
                log::debug!("No SELECT before JOIN at offset {}, skipping.", join);
                continue;
            };
            while let Some(outer) = last_select_before(start) {
                if !more_closing_than_opening(&self.text[start..join]) {
                    break;
                }
                start = outer;
            }

            if start < end_of_last {
                log::debug!(
                    "JOIN at offset {} belongs to the previous statement, skipping.",
                    join
                );
                continue;
            }

            let end = STATEMENT_END
                .find(&self.text[join..])
                .map_or(self.text.len(), |m| join + m.start());
            end_of_last = end;
            candidates.push(CandidateStatement { start, end });
        }
        candidates
    }
}

fn more_closing_than_opening(text: &str) -> bool {
    let (opening, closing) = text.chars().fold((0usize, 0usize), |(o, c), ch| match ch {
        '(' => (o + 1, c),
        ')' => (o, c + 1),
        _ => (o, c),
    });
    closing > opening
}
