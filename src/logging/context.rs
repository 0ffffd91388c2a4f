use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use parking_lot::Mutex;

use crate::console::LiveSender;
use crate::error::{ConsoleError, Result};
use crate::parsers::encoding::encode_line;
use crate::parsers::{split_path, Level, LogRecord};

struct LogFile {
    path: PathBuf,
    file: File,
}

/// Destination switches and sinks for emitted records.
///
/// Replaces process-wide logging flags with one explicit value that is
/// created, shared (usually behind `Arc`) and dropped by its owner.
pub struct LoggingContext {
    console_output: AtomicBool,
    file_output: AtomicBool,
    debug: AtomicBool,
    file_encoding: AtomicBool,
    log_file: Mutex<Option<LogFile>>,
    console: Mutex<Option<LiveSender>>,
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self {
            console_output: AtomicBool::new(true),
            file_output: AtomicBool::new(true),
            debug: AtomicBool::new(true),
            file_encoding: AtomicBool::new(true),
            log_file: Mutex::new(None),
            console: Mutex::new(None),
        }
    }
}

impl LoggingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to an existing file. A missing file disables file output
    /// and returns an error.
    pub fn set_log_file(&self, path: &Path) -> Result<()> {
        let mut slot = self.log_file.lock();
        if !path.exists() {
            *slot = None;
            return Err(ConsoleError::MissingFile(path.to_path_buf()));
        }
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| ConsoleError::io(path, e))?;
        *slot = Some(LogFile {
            path: path.to_path_buf(),
            file,
        });
        Ok(())
    }

    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file.lock().as_ref().map(|log| log.path.clone())
    }

    /// Echo lines to stdout
    pub fn set_console_output(&self, enable: bool) {
        self.console_output.store(enable, Ordering::Relaxed);
    }

    /// Write lines to the log file, if one is set
    pub fn set_file_output(&self, enable: bool) {
        self.file_output.store(enable, Ordering::Relaxed);
    }

    /// Let Debug records through
    pub fn set_debug(&self, enable: bool) {
        self.debug.store(enable, Ordering::Relaxed);
    }

    /// Write file lines through the line encoder
    pub fn set_file_encoding(&self, enable: bool) {
        self.file_encoding.store(enable, Ordering::Relaxed);
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Forward every record to a console
    pub fn attach_console(&self, sender: LiveSender) {
        *self.console.lock() = Some(sender);
    }

    pub fn detach_console(&self) {
        *self.console.lock() = None;
    }

    /// Build a record stamped with the local time and emit it
    pub fn log(&self, level: Level, source: &str, message: impl Into<String>) {
        let record = LogRecord::new(
            Some(Local::now().naive_local()),
            level,
            split_path(source),
            message,
        );
        self.emit(record);
    }

    /// Write `record` to every enabled sink and forward it to the attached
    /// console
    pub fn emit(&self, record: LogRecord) {
        if record.level == Level::Debug && !self.debug_enabled() {
            return;
        }
        let line = record.to_string();

        if self.console_output.load(Ordering::Relaxed) {
            let mut out = io::stdout().lock();
            if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                eprintln!("Console write error: {e}");
            }
        }

        if self.file_output.load(Ordering::Relaxed) {
            if let Some(log) = self.log_file.lock().as_mut() {
                let written = if self.file_encoding.load(Ordering::Relaxed) {
                    encode_line(&line)
                } else {
                    line
                };
                if let Err(e) = writeln!(log.file, "{written}").and_then(|()| log.file.flush()) {
                    eprintln!("File log write error on {}: {e}", log.path.display());
                }
            }
        }

        let mut console = self.console.lock();
        if let Some(sender) = console.as_ref() {
            if !sender.send_record(record) {
                *console = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogConsole;
    use crate::parsers::encoding::decode_line;
    use crate::parsers::LineParser;
    use std::fs;

    fn quiet() -> LoggingContext {
        let context = LoggingContext::new();
        context.set_console_output(false);
        context
    }

    #[test]
    fn test_file_output_plain_and_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let context = quiet();
        context.set_file_encoding(false);
        context.set_log_file(&path).unwrap();
        context.log(Level::Info, "Net::tcp", "connected");
        context.set_file_encoding(true);
        context.log(Level::Warning, "Net::tcp", "slow");

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" INFO Net::tcp >> connected"));

        let decoded = decode_line(lines[1]).unwrap();
        let record = LineParser::parse(&decoded);
        assert_eq!(record.level, Level::Warning);
        assert_eq!(record.message, "slow");
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_missing_log_file_disables_file_output() {
        let dir = tempfile::tempdir().unwrap();
        let context = quiet();
        let err = context.set_log_file(&dir.path().join("missing.log")).unwrap_err();
        assert!(matches!(err, ConsoleError::MissingFile(_)));
        assert!(context.log_file_path().is_none());
        context.log(Level::Info, "A", "nowhere to go");
    }

    #[test]
    fn test_debug_switch_and_console_forwarding() {
        let console = LogConsole::default();
        let context = quiet();
        context.set_file_output(false);
        context.attach_console(console.sender());

        context.set_debug(false);
        context.log(Level::Debug, "A", "dropped");
        context.log(Level::Info, "A", "kept");
        context.set_debug(true);
        context.log(Level::Debug, "A::b", "now kept");

        let texts: Vec<String> = console.drain_live().iter().map(|f| f.text()).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].ends_with("A >> kept"));
        assert!(texts[1].ends_with("A::b >> now kept"));

        context.detach_console();
        context.log(Level::Info, "A", "after detach");
        assert!(console.drain_live().is_empty());
    }

    #[test]
    fn test_dropped_console_is_released() {
        let context = quiet();
        context.set_file_output(false);
        {
            let console = LogConsole::default();
            context.attach_console(console.sender());
        }
        context.log(Level::Info, "A", "no receiver");
        assert!(context.console.lock().is_none());
    }
}
