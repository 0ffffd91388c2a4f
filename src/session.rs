//! Quick-start wiring of a console, a logging context and their files.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::console::LogConsole;
use crate::error::{ConsoleError, Result};
use crate::logging::{ConsoleLayer, LoggingContext};
use crate::settings::DEFAULT_SETTINGS_FILE;

/// Directory created under the base directory for logs and settings
pub const LOG_DIR_NAME: &str = "Logs";

/// Name of the log file for a session started at `started`
pub fn log_file_name(started: NaiveDateTime) -> String {
    started.format("%Y-%m-%d %H-%M-%S-%3f logFile.log").to_string()
}

/// A console with logging already pointed at it
pub struct Session {
    pub console: Arc<LogConsole>,
    pub context: Arc<LoggingContext>,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
    pub settings_file: PathBuf,
}

impl Session {
    /// Set up `<base>/Logs`, a fresh timestamped log file and the default
    /// settings file, which is loaded if present and written otherwise.
    ///
    /// Console and file output and Debug records are on; file encoding is
    /// off.
    pub fn quick_start(base_dir: &Path) -> Result<Self> {
        let log_dir = base_dir.join(LOG_DIR_NAME);
        fs::create_dir_all(&log_dir).map_err(|e| ConsoleError::io(&log_dir, e))?;

        let log_file = log_dir.join(log_file_name(Local::now().naive_local()));
        File::create(&log_file).map_err(|e| ConsoleError::io(&log_file, e))?;

        let context = Arc::new(LoggingContext::new());
        context.set_console_output(true);
        context.set_file_output(true);
        context.set_debug(true);
        context.set_file_encoding(false);
        context.set_log_file(&log_file)?;

        let console = Arc::new(LogConsole::default());
        console.set_log_file_path(&log_file);
        context.attach_console(console.sender());

        let settings_file = log_dir.join(DEFAULT_SETTINGS_FILE);
        if settings_file.exists() {
            console.load_settings(&settings_file)?;
        } else {
            console.save_settings(&settings_file)?;
        }

        tracing::debug!(
            log_file = %log_file.display(),
            settings = %settings_file.display(),
            "Console session started"
        );
        Ok(Self {
            console,
            context,
            log_dir,
            log_file,
            settings_file,
        })
    }

    /// A `tracing` layer feeding this session
    pub fn layer(&self) -> ConsoleLayer {
        ConsoleLayer::new(Arc::clone(&self.context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_log_file_name() {
        let started = NaiveDate::from_ymd_opt(2024, 9, 17)
            .unwrap()
            .and_hms_milli_opt(21, 31, 40, 75)
            .unwrap();
        assert_eq!(log_file_name(started), "2024-09-17 21-31-40-075 logFile.log");
    }

    #[test]
    fn test_quick_start_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::quick_start(dir.path()).unwrap();
        assert!(session.log_file.exists());
        assert!(session.settings_file.exists());
        assert_eq!(session.console.log_file_path(), Some(session.log_file.clone()));
        assert_eq!(session.context.log_file_path(), Some(session.log_file.clone()));

        session.context.set_console_output(false);
        session.context.log(crate::parsers::Level::Info, "Boot", "ready");
        let fragments = session.console.drain_live();
        assert_eq!(fragments.len(), 1);
        let written = fs::read_to_string(&session.log_file).unwrap();
        assert!(written.contains("INFO Boot >> ready"));
    }

    #[test]
    fn test_session_layer_feeds_console_and_file() {
        use tracing_subscriber::layer::SubscriberExt;

        let dir = tempfile::tempdir().unwrap();
        let session = Session::quick_start(dir.path()).unwrap();
        session.context.set_console_output(false);

        let subscriber = tracing_subscriber::registry().with(session.layer());
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "net::tcp", "link down");
        });

        let fragments = session.console.drain_live();
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].text().ends_with("net::tcp >> link down"));
        assert!(session
            .console
            .filter_snapshot()
            .find(&["net", "tcp"])
            .is_some());
        let written = fs::read_to_string(&session.log_file).unwrap();
        assert!(written.contains("WARNING net::tcp >> link down"));
    }

    #[test]
    fn test_quick_start_reuses_settings() {
        let dir = tempfile::tempdir().unwrap();
        let first = Session::quick_start(dir.path()).unwrap();
        let mut config = first.console.config();
        config.fields.date = true;
        first.console.set_config(config);
        first.console.save_settings(&first.settings_file).unwrap();

        let second = Session::quick_start(dir.path()).unwrap();
        assert!(second.console.config().fields.date);
    }
}
