//! Append-only record history.

use std::sync::Arc;

use crate::parsers::LogRecord;

/// Ordered sequence of every record the console has seen.
///
/// Records are shared behind `Arc` so snapshots taken for re-rendering do not
/// copy message text.
#[derive(Clone, Debug, Default)]
pub struct HistoryStore {
    records: Vec<Arc<LogRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: LogRecord) -> Arc<LogRecord> {
        let record = Arc::new(record);
        self.records.push(Arc::clone(&record));
        record
    }

    pub fn extend<I: IntoIterator<Item = LogRecord>>(&mut self, records: I) {
        self.records.extend(records.into_iter().map(Arc::new));
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<LogRecord>] {
        &self.records
    }

    /// Cheap copy of the current contents
    pub fn snapshot(&self) -> Vec<Arc<LogRecord>> {
        self.records.clone()
    }

    /// Consecutive blocks of at most `block_size` records, in order
    pub fn blocks(&self, block_size: usize) -> std::slice::Chunks<'_, Arc<LogRecord>> {
        self.records.chunks(block_size.max(1))
    }
}
