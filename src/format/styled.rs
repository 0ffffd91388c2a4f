use serde::Serialize;

use crate::state::Rgb;

/// A span of text with one foreground and an optional background
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StyledRun {
    pub text: String,
    pub foreground: Rgb,
    pub background: Option<Rgb>,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, foreground: Rgb) -> Self {
        Self {
            text: text.into(),
            foreground,
            background: None,
        }
    }

    pub fn with_background(mut self, background: Option<Rgb>) -> Self {
        self.background = background;
        self
    }
}

/// One rendered line; empty when the record is filtered out
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StyledFragment {
    pub runs: Vec<StyledRun>,
}

impl StyledFragment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, run: StyledRun) {
        self.runs.push(run);
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Plain text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

impl From<StyledRun> for StyledFragment {
    fn from(run: StyledRun) -> Self {
        Self { runs: vec![run] }
    }
}
