//! The log console: history, filter and display settings behind one handle.
//!
//! Producers on any thread hand records to a [`LiveSender`]; the owner of the
//! console drains them with [`LogConsole::drain_live`] and gets back rendered
//! fragments. History loads and re-renders run block-wise through a
//! [`BatchProcessor`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::batch::{BatchOptions, BatchProcessor};
use crate::display::DisplayConfig;
use crate::error::{ConsoleError, Result};
use crate::filter::{CheckState, FilterTree};
use crate::format::{RecordFormatter, StyledFragment};
use crate::history::HistoryStore;
use crate::parsers::{LineParser, LogRecord, Parseable};
use crate::settings::ConsoleSettings;
use crate::state::Rgb;

/// File extensions accepted by [`LogConsole::load_history_file`]
pub const HISTORY_EXTENSIONS: &[&str] = &["log", "txt"];

/// Something queued for the console by another thread
#[derive(Clone, Debug)]
pub enum LiveEvent {
    Record(LogRecord),
    Line(String),
}

/// Cloneable, non-blocking producer handle for live records
#[derive(Clone, Debug)]
pub struct LiveSender {
    sender: Sender<LiveEvent>,
}

impl LiveSender {
    /// Queue a record. Returns `false` once the console is gone.
    pub fn send_record(&self, record: LogRecord) -> bool {
        self.sender.send(LiveEvent::Record(record)).is_ok()
    }

    /// Queue a line in the console wire format
    pub fn send_line(&self, line: impl Into<String>) -> bool {
        self.sender.send(LiveEvent::Line(line.into())).is_ok()
    }
}

/// Outcome of a history load
#[derive(Clone, Debug, Default)]
pub struct HistoryLoad {
    /// Rendered fragments of the loaded records, filtered records omitted
    pub fragments: Vec<StyledFragment>,
    pub records: usize,
    pub discovered_paths: usize,
    pub cancelled: bool,
}

pub struct LogConsole {
    history: Mutex<HistoryStore>,
    filter: RwLock<FilterTree>,
    config: RwLock<DisplayConfig>,
    custom_colors: Mutex<Vec<Rgb>>,
    processor: BatchProcessor,
    live_sender: Sender<LiveEvent>,
    live_receiver: Mutex<Receiver<LiveEvent>>,
    log_file_path: Mutex<Option<PathBuf>>,
    settings_path: Mutex<Option<PathBuf>>,
}

impl Default for LogConsole {
    fn default() -> Self {
        Self::new(DisplayConfig::default(), BatchOptions::default())
    }
}

impl LogConsole {
    pub fn new(config: DisplayConfig, options: BatchOptions) -> Self {
        let (live_sender, live_receiver) = channel();
        Self {
            history: Mutex::new(HistoryStore::new()),
            filter: RwLock::new(FilterTree::new()),
            config: RwLock::new(config),
            custom_colors: Mutex::new(Vec::new()),
            processor: BatchProcessor::new(LineParser::default(), options),
            live_sender,
            live_receiver: Mutex::new(live_receiver),
            log_file_path: Mutex::new(None),
            settings_path: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------------
    // Live appends
    // ------------------------------------------------------------------------

    /// Producer handle for other threads
    pub fn sender(&self) -> LiveSender {
        LiveSender {
            sender: self.live_sender.clone(),
        }
    }

    /// Append a record and render it.
    ///
    /// The record's path is registered in the filter first. The returned
    /// fragment is empty if the record is filtered out.
    pub fn append_record(&self, record: LogRecord) -> StyledFragment {
        let visible = record.source_path.is_empty() || {
            let mut filter = self.filter.write();
            filter.add_path(&record.source_path);
            filter.is_visible(&record.source_path)
        };
        let record = self.history.lock().append(record);
        if !visible {
            return StyledFragment::empty();
        }
        RecordFormatter::new(*self.config.read()).render(&record)
    }

    /// Parse a wire-format line and append it
    pub fn append_raw_line(&self, line: &str) -> StyledFragment {
        self.append_record(self.processor.parser().parse_line(line))
    }

    /// Append everything queued through [`LiveSender`]s, in send order
    pub fn drain_live(&self) -> Vec<StyledFragment> {
        let events: Vec<LiveEvent> = self.live_receiver.lock().try_iter().collect();
        events
            .into_iter()
            .map(|event| match event {
                LiveEvent::Record(record) => self.append_record(record),
                LiveEvent::Line(line) => self.append_raw_line(&line),
            })
            .filter(|fragment| !fragment.is_empty())
            .collect()
    }

    // ------------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------------

    /// Parse `lines`, register their paths, append them to history and
    /// render them
    pub fn load_history<S>(&self, lines: &[S]) -> HistoryLoad
    where
        S: AsRef<str> + Sync,
    {
        self.load_history_cancellable(lines, &AtomicBool::new(false))
    }

    pub fn load_history_cancellable<S>(&self, lines: &[S], cancel: &AtomicBool) -> HistoryLoad
    where
        S: AsRef<str> + Sync,
    {
        let batch = self.processor.process_cancellable(lines, cancel);
        batch.register_paths(&mut self.filter.write());

        let loaded: Vec<Arc<LogRecord>> = {
            let mut history = self.history.lock();
            let start = history.len();
            history.extend(batch.records);
            history.records()[start..].to_vec()
        };

        let formatter = RecordFormatter::new(*self.config.read());
        let filter = self.filter_snapshot();
        let fragments = self.processor.format_history(&loaded, &formatter, &filter);

        tracing::info!(
            records = loaded.len(),
            paths = batch.discovered_paths.len(),
            cancelled = batch.cancelled,
            "Loaded log history"
        );
        HistoryLoad {
            fragments,
            records: loaded.len(),
            discovered_paths: batch.discovered_paths.len(),
            cancelled: batch.cancelled,
        }
    }

    /// Load a `.log` or `.txt` file into history.
    ///
    /// On error nothing is changed.
    pub fn load_history_file(&self, path: &Path) -> Result<HistoryLoad> {
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| HISTORY_EXTENSIONS.contains(&ext));
        if !supported {
            return Err(ConsoleError::UnsupportedFile(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|e| ConsoleError::io(path, e))?;
        let len = file.metadata().map_err(|e| ConsoleError::io(path, e))?.len();

        let load = if len == 0 {
            HistoryLoad::default()
        } else {
            // SAFETY: the map is read-only and dropped before returning. A log
            // file being appended to while mapped only adds bytes past `len`.
            let mmap =
                unsafe { memmap2::Mmap::map(&file) }.map_err(|e| ConsoleError::io(path, e))?;
            let text = String::from_utf8_lossy(&mmap);
            let lines: Vec<&str> = text.lines().collect();
            self.load_history(&lines)
        };

        *self.log_file_path.lock() = Some(path.to_path_buf());
        Ok(load)
    }

    /// Path of the last history file loaded
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file_path.lock().clone()
    }

    pub fn set_log_file_path(&self, path: impl Into<PathBuf>) {
        *self.log_file_path.lock() = Some(path.into());
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Shared copies of every record, oldest first
    pub fn history_snapshot(&self) -> Vec<Arc<LogRecord>> {
        self.history.lock().snapshot()
    }

    /// Drop the history. Filter and settings are kept.
    pub fn clear(&self) {
        self.history.lock().clear();
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Re-render the whole history under the current config and filter
    pub fn rebuild_view(&self) -> Vec<StyledFragment> {
        let config = *self.config.read();
        let filter = self.filter_snapshot();
        self.rebuild_view_with(&config, &filter)
    }

    /// Re-render the whole history under an explicit config and filter
    pub fn rebuild_view_with(
        &self,
        config: &DisplayConfig,
        filter: &FilterTree,
    ) -> Vec<StyledFragment> {
        let records = self.history_snapshot();
        let formatter = RecordFormatter::new(*config);
        self.processor.format_history(&records, &formatter, filter)
    }

    pub fn config(&self) -> DisplayConfig {
        *self.config.read()
    }

    pub fn set_config(&self, config: DisplayConfig) {
        *self.config.write() = config;
    }

    // ------------------------------------------------------------------------
    // Filter
    // ------------------------------------------------------------------------

    /// Copy of the filter for rendering or display
    pub fn filter_snapshot(&self) -> FilterTree {
        self.filter.read().clone()
    }

    /// Run `f` with exclusive access to the filter
    pub fn with_filter<R>(&self, f: impl FnOnce(&mut FilterTree) -> R) -> R {
        f(&mut self.filter.write())
    }

    /// Enable or disable one path; `false` if it is not registered
    pub fn set_filter_leaf<S: AsRef<str>>(&self, path: &[S], enabled: bool) -> bool {
        self.filter.write().set_leaf_state(path, enabled)
    }

    /// Force a path and everything below it; the empty path is the whole
    /// tree. `false` if the path is not registered.
    pub fn set_filter_subtree<S: AsRef<str>>(&self, path: &[S], enabled: bool) -> bool {
        let mut filter = self.filter.write();
        match filter.find(path) {
            Some(id) => filter.set_subtree_state(id, CheckState::from_bool(enabled)),
            None => false,
        }
    }

    pub fn export_filter_state(&self) -> Vec<(String, bool)> {
        self.filter.read().to_flat_list()
    }

    pub fn import_filter_state<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        self.filter.write().apply_flat_list(entries);
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    pub fn custom_colors(&self) -> Vec<Rgb> {
        self.custom_colors.lock().clone()
    }

    pub fn set_custom_colors(&self, colors: Vec<Rgb>) {
        *self.custom_colors.lock() = colors;
    }

    /// Current settings as a persistable value
    pub fn settings(&self) -> ConsoleSettings {
        ConsoleSettings {
            display: self.config(),
            custom_colors: self.custom_colors(),
            filter: self.export_filter_state().into_iter().collect(),
        }
    }

    pub fn save_settings(&self, path: &Path) -> Result<()> {
        self.settings().save(path)?;
        *self.settings_path.lock() = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Saved console settings");
        Ok(())
    }

    /// Load settings from `path`. The filter entries are merged into the
    /// current filter. On error nothing is changed.
    pub fn load_settings(&self, path: &Path) -> Result<()> {
        let settings = ConsoleSettings::load(path)?;
        self.apply_settings(&settings);
        *self.settings_path.lock() = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded console settings");
        Ok(())
    }

    pub fn apply_settings(&self, settings: &ConsoleSettings) {
        self.set_config(settings.display);
        self.set_custom_colors(settings.custom_colors.clone());
        self.import_filter_state(settings.filter_entries());
    }

    /// Path of the last settings file saved or loaded
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_path.lock().clone()
    }
}
