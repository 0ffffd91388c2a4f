use chrono::Timelike;

use super::styled::{StyledFragment, StyledRun};
use crate::display::DisplayConfig;
use crate::filter::FilterTree;
use crate::parsers::LogRecord;
use crate::state::Rgb;

/// How the header fields are colored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// One run per field, each in its own color
    Segmented,
    /// The whole line as one run in the level color
    Flat,
}

impl RenderMode {
    pub fn from_extended(extended_colors: bool) -> Self {
        if extended_colors {
            RenderMode::Segmented
        } else {
            RenderMode::Flat
        }
    }
}

/// Turns records into styled fragments under a fixed display config.
///
/// Pure given the config and the filter passed to [`RecordFormatter::format`],
/// so one formatter can be shared across worker threads.
#[derive(Clone, Debug)]
pub struct RecordFormatter {
    config: DisplayConfig,
    mode: RenderMode,
}

impl RecordFormatter {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            mode: RenderMode::from_extended(config.extended_colors),
            config,
        }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render one record, or an empty fragment if its level is disabled or
    /// its source is filtered out
    pub fn format(&self, record: &LogRecord, filter: &FilterTree) -> StyledFragment {
        if !filter.is_visible(&record.source_path) {
            return StyledFragment::empty();
        }
        self.render(record)
    }

    /// Render a record whose source is already known to be visible.
    ///
    /// Only the level mask is checked.
    pub fn render(&self, record: &LogRecord) -> StyledFragment {
        if !self.config.levels.is_enabled(record.level) {
            return StyledFragment::empty();
        }

        let colors = &self.config.colors;
        let message_fg = colors.message_color(record.level);
        let message_bg = colors.background(record.level);

        if record.raw_only {
            return StyledRun::new(record.message.as_str(), message_fg)
                .with_background(message_bg)
                .into();
        }

        let header = self.header_fields(record);
        let message = format!(">> {}", record.message);

        match self.mode {
            RenderMode::Segmented => {
                let mut fragment = StyledFragment::empty();
                for (text, color) in header {
                    fragment.push(StyledRun::new(text, color));
                }
                fragment.push(StyledRun::new(message, message_fg).with_background(message_bg));
                fragment
            }
            RenderMode::Flat => {
                let mut line: String = header.into_iter().map(|(text, _)| text).collect();
                line.push_str(&message);
                StyledRun::new(line, message_fg)
                    .with_background(message_bg)
                    .into()
            }
        }
    }

    /// Render a block in order, dropping filtered records
    pub fn format_block<'a, I>(&self, records: I, filter: &FilterTree) -> Vec<StyledFragment>
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        records
            .into_iter()
            .map(|record| self.format(record, filter))
            .filter(|fragment| !fragment.is_empty())
            .collect()
    }

    /// Enabled header fields with their colors, each followed by one space
    fn header_fields(&self, record: &LogRecord) -> Vec<(String, Rgb)> {
        let fields = &self.config.fields;
        let colors = &self.config.colors;
        let mut out = Vec::with_capacity(4);

        if let Some(ts) = record.timestamp {
            if fields.date {
                out.push((ts.format("%Y-%m-%d ").to_string(), colors.date));
            }
            if fields.time {
                let time = if fields.time_millis {
                    format!(
                        "{}.{:03} ",
                        ts.format("%H:%M:%S"),
                        ts.nanosecond() / 1_000_000 % 1000
                    )
                } else {
                    ts.format("%H:%M:%S ").to_string()
                };
                out.push((time, colors.time));
            }
        }
        if fields.level {
            out.push((format!("{} ", record.level.tag()), colors.level));
        }
        if fields.source && !record.source_path.is_empty() {
            out.push((format!("{} ", record.source()), colors.source));
        }
        out
    }
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}
