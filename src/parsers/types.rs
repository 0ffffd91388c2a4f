use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoStaticStr};

use crate::state::{MESSAGE_SEPARATOR, PATH_DELIMITER};

/// Severity of a log record
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    #[default]
    Debug,
    Info,
    Warning,
    Critical,
    Fatal,
}

impl Level {
    /// Uppercase tag used on the wire and in rendered lines
    pub fn tag(&self) -> &'static str {
        self.into()
    }

    /// Match a level token by case-insensitive substring.
    ///
    /// Names are tried in the order INFO, DEBUG, WARNING, CRITICAL, FATAL and
    /// the first hit wins. Anything else is treated as Debug.
    pub fn from_token(token: &str) -> Level {
        let upper = token.to_ascii_uppercase();
        [
            Level::Info,
            Level::Debug,
            Level::Warning,
            Level::Critical,
            Level::Fatal,
        ]
        .into_iter()
        .find(|level| upper.contains(level.tag()))
        .unwrap_or_default()
    }

    /// Levels rendered with a background color
    pub fn has_background(&self) -> bool {
        matches!(self, Level::Critical | Level::Fatal)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single log record, immutable once built
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: Option<NaiveDateTime>,
    pub level: Level,
    /// Namespace/class/function segments
    pub source_path: Vec<String>,
    pub message: String,
    /// The line could not be decomposed; only `message` is meaningful
    pub raw_only: bool,
}

impl LogRecord {
    pub fn new(
        timestamp: Option<NaiveDateTime>,
        level: Level,
        source_path: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level,
            source_path,
            message: message.into(),
            raw_only: false,
        }
    }

    /// A record holding an undecomposed line
    pub fn raw(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw_only: true,
            ..Default::default()
        }
    }

    /// Source path joined with `::`
    pub fn source(&self) -> String {
        self.source_path.join(PATH_DELIMITER)
    }
}

/// Split a `::`-joined path into its segments
pub fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(PATH_DELIMITER).map(str::to_string).collect()
}

/// Renders the wire form: `yyyy-MM-dd hh:mm:ss.zzz LEVEL path >> message`
impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw_only {
            return f.write_str(&self.message);
        }

        match self.timestamp {
            Some(ts) => write!(
                f,
                "{}{:03}",
                ts.format("%Y-%m-%d %H:%M:%S."),
                ts.nanosecond() / 1_000_000 % 1000
            )?,
            None => f.write_str("0000-00-00 00:00:00.000")?,
        }

        write!(f, " {}", self.level)?;
        if !self.source_path.is_empty() {
            write!(f, " {}", self.source())?;
        }
        write!(f, "{}{}", MESSAGE_SEPARATOR, self.message)
    }
}

/// Trait for line parsers.
///
/// Parsing is a pure function of the line, which is what lets batch loads
/// run blocks on worker threads without changing the result order.
pub trait Parseable: Send + Sync {
    fn parse_line(&self, line: &str) -> LogRecord;
}
