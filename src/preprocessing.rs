use crate::{
    config::Config,
    eraser::{EraserState, StopFunctionEraser},
    normalizer::DialectNormalizer,
    segmenter::NormalizedScript,
};

/// Makes a raw script digestible by the grammar and cuts it into statements.
pub struct Preprocessor {
    normalizer: DialectNormalizer,
    eraser: StopFunctionEraser,
}

impl Preprocessor {
    pub fn new(normalizer: DialectNormalizer, eraser: StopFunctionEraser) -> Self {
        Self { normalizer, eraser }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            DialectNormalizer::new(&config.stop_patterns)?,
            StopFunctionEraser::new(&config.stop_functions, &config.placeholder)?,
        ))
    }

    /// Normalizes every line and erases stop-function calls. Lines swallowed by
    /// a call are not part of the result.
    pub fn normalize<'a, I>(&self, lines: I) -> NormalizedScript
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (state, script) = lines.into_iter().fold(
            (EraserState::default(), NormalizedScript::new()),
            |(state, mut script), line| {
                let stripped = self.normalizer.strip_stop_patterns(line);
                let (state, erased) = self.eraser.erase_line(state, &stripped);
                if let Some(erased) = erased {
                    script.push_line(&DialectNormalizer::rewrite(&erased));
                }
                (state, script)
            },
        );
        if state.in_call() {
            log::warn!("Script ends inside a stop-function call, output is partial.");
        }
        script
    }

    /// Statements of the script that contain at least one join.
    pub fn clear_statements<'a, I>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.normalize(lines).statements()
    }
}
