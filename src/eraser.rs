use anyhow::anyhow;
use regex::{Regex, RegexBuilder};

/// State carried from one line to the next while erasing stop-function calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EraserState {
    /// A stop-function name was seen but its opening bracket was not.
    pub pending_open: bool,
    /// Bracket balance inside the argument list of the call being erased.
    pub open_brackets: i32,
}

impl EraserState {
    pub fn in_call(&self) -> bool {
        self.pending_open || self.open_brackets > 0
    }
}

enum CallEnd {
    Closed(usize),
    Open(i32),
}

// Byte index of the bracket that brings the balance to zero.
fn find_call_end(text: &str, mut balance: i32) -> CallEnd {
    for (idx, c) in text.char_indices() {
        match c {
            '(' => balance += 1,
            ')' => balance -= 1,
            _ => {}
        }
        if balance == 0 {
            return CallEnd::Closed(idx);
        }
    }
    CallEnd::Open(balance)
}

/// Replaces calls to functions the grammar does not know with a placeholder.
///
/// `IIF(a > 1, 'x', 'y')` becomes `a` (for placeholder `a`), also when the call
/// spans several lines. Stop-function calls nested inside one another are erased
/// as a single span.
pub struct StopFunctionEraser {
    pattern: Option<Regex>,
    placeholder: String,
}

impl StopFunctionEraser {
    pub fn new<S: AsRef<str>>(stop_functions: &[S], placeholder: &str) -> anyhow::Result<Self> {
        let pattern = if stop_functions.is_empty() {
            None
        } else {
            let names = stop_functions
                .iter()
                .map(|name| regex::escape(name.as_ref()))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = RegexBuilder::new(&format!(r"(^|,|\(|\s)({})(\(|\s|$)", names))
                .case_insensitive(true)
                .build()
                .map_err(|err| anyhow!("Invalid stop functions {}: {}", names, err))?;
            Some(pattern)
        };
        Ok(Self {
            pattern,
            placeholder: placeholder.to_owned(),
        })
    }

    /// Erases stop-function calls from one line.
    ///
    /// Returns the next state and the surviving text, or `None` when the whole
    /// line belongs to a call that is still open.
    pub fn erase_line(&self, state: EraserState, line: &str) -> (EraserState, Option<String>) {
        let mut state = state;
        let mut line = line.to_owned();

        if state.pending_open {
            match line.find('(') {
                Some(idx) => {
                    line.replace_range(..=idx, "");
                    state = EraserState {
                        pending_open: false,
                        open_brackets: 1,
                    };
                }
                None => return (state, None),
            }
        }

        if state.open_brackets > 0 {
            match find_call_end(&line, state.open_brackets) {
                CallEnd::Closed(idx) => {
                    line.replace_range(..=idx, "");
                    state.open_brackets = 0;
                }
                CallEnd::Open(balance) => {
                    state.open_brackets = balance;
                    return (state, None);
                }
            }
        }

        let Some(pattern) = &self.pattern else {
            return (state, Some(line));
        };

        let mut search_from = 0;
        while let Some(caps) = pattern.captures_at(&line, search_from) {
            let (Some(separator), Some(name)) = (caps.get(1), caps.get(2)) else {
                break;
            };
            let prefix_end = separator.end();
            let name_end = name.end();

            let Some(open_offset) = line[name_end..].find('(') else {
                // Arguments start on a later line.
                line.truncate(prefix_end);
                line.push_str(&self.placeholder);
                state.pending_open = true;
                break;
            };

            let args_start = name_end + open_offset + 1;
            match find_call_end(&line[args_start..], 1) {
                CallEnd::Closed(idx) => {
                    let suffix = line[args_start + idx + 1..].to_owned();
                    line.truncate(prefix_end);
                    line.push_str(&self.placeholder);
                    search_from = line.len();
                    line.push_str(&suffix);
                }
                CallEnd::Open(balance) => {
                    line.truncate(prefix_end);
                    line.push_str(&self.placeholder);
                    state.open_brackets = balance;
                    break;
                }
            }
        }

        (state, Some(line))
    }

    /// Folds [`StopFunctionEraser::erase_line`] over a whole script, starting
    /// from a fresh state.
    pub fn erase_lines<'a, I>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .fold(
                (EraserState::default(), Vec::new()),
                |(state, mut out), line| {
                    let (state, erased) = self.erase_line(state, line);
                    out.extend(erased);
                    (state, out)
                },
            )
            .1
    }
}
