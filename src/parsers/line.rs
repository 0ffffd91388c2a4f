//! Console line parser.
//!
//! Grammar: `yyyy-MM-dd hh:mm:ss[.zzz] LEVEL source::path >> message`.
//! Lines without the ` >> ` separator, or with fewer than three header
//! tokens, become raw records carrying the whole line as their message.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::encoding;
use super::types::{split_path, Level, LogRecord, Parseable};
use crate::state::MESSAGE_SEPARATOR;

/// Parser for the console line format
#[derive(Clone, Copy, Debug)]
pub struct LineParser {
    /// Transparently decode lines written by the line encoder
    pub decode_encoded: bool,
}

impl Default for LineParser {
    fn default() -> Self {
        Self {
            decode_encoded: true,
        }
    }
}

impl LineParser {
    /// Parse one line of the plain format
    pub fn parse(line: &str) -> LogRecord {
        let Some(sep) = line.find(MESSAGE_SEPARATOR) else {
            return LogRecord::raw(line);
        };

        let message = &line[sep + MESSAGE_SEPARATOR.len()..];
        let tokens: Vec<&str> = line[..sep].split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.len() < 3 {
            return LogRecord::raw(line);
        }

        let timestamp = match (Self::parse_date(tokens[0]), Self::parse_time(tokens[1])) {
            (Some(date), Some(time)) => Some(NaiveDateTime::new(date, time)),
            _ => None,
        };

        LogRecord {
            timestamp,
            level: Level::from_token(tokens[2]),
            source_path: tokens.get(3).map(|p| split_path(p)).unwrap_or_default(),
            message: message.to_string(),
            raw_only: false,
        }
    }

    /// Lenient integer parse: anything malformed counts as 0
    fn int(token: &str) -> u32 {
        token.trim().parse().unwrap_or(0)
    }

    /// Parse `yyyy-MM-dd`; `None` if the numbers are not a calendar date
    fn parse_date(token: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = token.split('-').collect();
        if parts.len() < 3 {
            return None;
        }
        let year = i32::try_from(Self::int(parts[0])).ok()?;
        NaiveDate::from_ymd_opt(year, Self::int(parts[1]), Self::int(parts[2]))
    }

    /// Parse `hh:mm:ss[.zzz]`, milliseconds defaulting to 0.
    ///
    /// Leap seconds are not accepted: seconds must be below 60 and
    /// milliseconds below 1000.
    fn parse_time(token: &str) -> Option<NaiveTime> {
        let parts: Vec<&str> = token.split(':').collect();
        if parts.len() < 3 {
            return None;
        }
        let (seconds, millis) = match parts[2].split_once('.') {
            Some((s, ms)) => (Self::int(s), Self::int(ms)),
            None => (Self::int(parts[2]), 0),
        };
        if seconds >= 60 || millis >= 1000 {
            return None;
        }
        NaiveTime::from_hms_milli_opt(Self::int(parts[0]), Self::int(parts[1]), seconds, millis)
    }
}

impl Parseable for LineParser {
    fn parse_line(&self, line: &str) -> LogRecord {
        if self.decode_encoded {
            Self::parse(&encoding::decode_or_keep(line))
        } else {
            Self::parse(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_full_line() {
        let record = LineParser::parse("2024-09-17 21:31:40.175 INFO MyClass::run >> started");
        assert!(!record.raw_only);
        let ts = record.timestamp.unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 9, 17));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (21, 31, 40));
        assert_eq!(ts.nanosecond() / 1_000_000, 175);
        assert_eq!(record.level, Level::Info);
        assert_eq!(record.source_path, vec!["MyClass", "run"]);
        assert_eq!(record.message, "started");
    }

    #[test]
    fn test_parse_without_separator() {
        let record = LineParser::parse("hello world");
        assert!(record.raw_only);
        assert_eq!(record.message, "hello world");
        assert!(record.source_path.is_empty());
    }

    #[test]
    fn test_parse_too_few_tokens() {
        let record = LineParser::parse("21:31:40 INFO >> short");
        assert!(record.raw_only);
        assert_eq!(record.message, "21:31:40 INFO >> short");
    }

    #[test]
    fn test_parse_without_millis_or_path() {
        let record = LineParser::parse("2024-01-02 03:04:05 warning >> disk");
        let ts = record.timestamp.unwrap();
        assert_eq!(ts.second(), 5);
        assert_eq!(ts.nanosecond(), 0);
        assert_eq!(record.level, Level::Warning);
        assert!(record.source_path.is_empty());
        assert_eq!(record.message, "disk");
    }

    #[test]
    fn test_message_is_verbatim() {
        let record = LineParser::parse("2024-01-02 03:04:05.000 DEBUG A >>   spaced >> twice  ");
        assert_eq!(record.message, "  spaced >> twice  ");
    }

    #[test]
    fn test_extra_spaces_between_tokens() {
        let record = LineParser::parse("2024-01-02   03:04:05.010  FATAL   Core::boot >> x");
        assert_eq!(record.level, Level::Fatal);
        assert_eq!(record.source_path, vec!["Core", "boot"]);
    }

    #[test]
    fn test_malformed_numbers_do_not_panic() {
        let record = LineParser::parse("20x4-ab-17 2b:31:zz.q INFO A::b >> m");
        assert!(!record.raw_only);
        assert_eq!(record.timestamp, None);
        assert_eq!(record.level, Level::Info);
        assert_eq!(record.message, "m");

        let record = LineParser::parse("2024-13-40 99:99:99.9999 INFO A >> m");
        assert_eq!(record.timestamp, None);
    }

    #[test]
    fn test_out_of_range_millis_have_no_timestamp() {
        for line in [
            "2024-01-01 23:59:59.1500 INFO A >> m",
            "2024-01-01 12:00:00.1000 INFO A >> m",
            "2024-01-01 23:59:60.500 INFO A >> m",
        ] {
            let record = LineParser::parse(line);
            assert!(!record.raw_only);
            assert_eq!(record.timestamp, None, "{line}");
            assert_eq!(LineParser::parse(&record.to_string()), record);
        }

        let record = LineParser::parse("2024-01-01 23:59:59.999 INFO A >> m");
        assert_eq!(record.timestamp.unwrap().nanosecond(), 999_000_000);
    }

    #[test]
    fn test_unknown_level_defaults_to_debug() {
        let record = LineParser::parse("2024-01-02 03:04:05.000 VERBOSE A >> m");
        assert_eq!(record.level, Level::Debug);
    }

    #[test]
    fn test_wire_round_trip() {
        let line = "2023-12-31 23:59:59.999 CRITICAL Net::Socket::read >> timeout after 3s";
        let record = LineParser::parse(line);
        assert_eq!(record.to_string(), line);
        assert_eq!(LineParser::parse(&record.to_string()), record);

        let no_time = LogRecord::new(None, Level::Info, vec!["A".into()], "m");
        assert_eq!(LineParser::parse(&no_time.to_string()), no_time);
    }

    #[test]
    fn test_encoded_line() {
        let line = "2024-09-17 21:31:40.175 INFO MyClass::run >> started";
        let encoded = encoding::encode_line(line);

        let parser = LineParser::default();
        assert_eq!(parser.parse_line(&encoded), LineParser::parse(line));

        let literal = LineParser {
            decode_encoded: false,
        };
        assert!(literal.parse_line(&encoded).raw_only);
    }
}
