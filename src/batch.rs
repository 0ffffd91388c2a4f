//! Block-wise history loading.
//!
//! Input lines are cut into fixed-size blocks. Small loads are parsed on the
//! calling thread; large ones go to a dedicated rayon pool that lives only
//! for the duration of the load. Either way the output keeps block order, so
//! both paths produce identical records.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::filter::FilterTree;
use crate::format::{RecordFormatter, StyledFragment};
use crate::parsers::{LineParser, LogRecord, Parseable};
use crate::state::{BATCH_WORKER_CAP, BLOCK_LINE_COUNT, CONCURRENT_LINE_THRESHOLD};

/// Which path a batch takes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Worker pool at or above the threshold, caller thread below it
    #[default]
    Auto,
    Sequential,
    Concurrent,
}

/// Tuning for batch loads and re-renders
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    pub block_size: usize,
    pub concurrent_threshold: usize,
    pub worker_cap: usize,
    pub mode: ExecutionMode,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            block_size: BLOCK_LINE_COUNT,
            concurrent_threshold: CONCURRENT_LINE_THRESHOLD,
            worker_cap: BATCH_WORKER_CAP,
            mode: ExecutionMode::Auto,
        }
    }
}

impl BatchOptions {
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    fn concurrent_for(&self, count: usize) -> bool {
        match self.mode {
            ExecutionMode::Auto => count >= self.concurrent_threshold,
            ExecutionMode::Sequential => false,
            ExecutionMode::Concurrent => true,
        }
    }

    fn block_size(&self) -> usize {
        self.block_size.max(1)
    }
}

/// Result of parsing a batch of lines
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedBatch {
    /// Records in input order
    pub records: Vec<LogRecord>,
    /// Distinct non-empty source paths, in order of first appearance
    pub discovered_paths: Vec<Vec<String>>,
    /// The run stopped early; `records` holds the leading blocks that finished
    pub cancelled: bool,
}

impl ProcessedBatch {
    /// Register every discovered path in `filter`
    pub fn register_paths(&self, filter: &mut FilterTree) {
        for path in &self.discovered_paths {
            filter.add_path(path);
        }
    }
}

/// Parses line batches in blocks, optionally on a bounded worker pool
#[derive(Clone, Debug, Default)]
pub struct BatchProcessor<P = LineParser> {
    parser: P,
    options: BatchOptions,
}

impl<P: Parseable> BatchProcessor<P> {
    pub fn new(parser: P, options: BatchOptions) -> Self {
        Self { parser, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Parse all lines
    pub fn process_file<S>(&self, lines: &[S]) -> ProcessedBatch
    where
        S: AsRef<str> + Sync,
    {
        self.process_cancellable(lines, &AtomicBool::new(false))
    }

    /// Parse all lines, checking `cancel` before each block
    pub fn process_cancellable<S>(&self, lines: &[S], cancel: &AtomicBool) -> ProcessedBatch
    where
        S: AsRef<str> + Sync,
    {
        let blocks: Vec<&[S]> = lines.chunks(self.options.block_size()).collect();
        let concurrent = self.options.concurrent_for(lines.len());
        tracing::debug!(
            lines = lines.len(),
            blocks = blocks.len(),
            concurrent,
            "Processing history batch"
        );

        let run_block = |block: &&[S]| -> Option<Vec<LogRecord>> {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            Some(self.parse_block(block))
        };

        let parsed: Vec<Option<Vec<LogRecord>>> = match self.pool_for(concurrent) {
            Some(pool) => pool.install(|| blocks.par_iter().map(run_block).collect()),
            None => blocks.iter().map(run_block).collect(),
        };

        // Keep the finished leading blocks so a cancelled run is still a
        // prefix of the full result.
        let cancelled = parsed.iter().any(Option::is_none);
        let records: Vec<LogRecord> = parsed
            .into_iter()
            .map_while(|block| block)
            .flatten()
            .collect();
        if cancelled {
            tracing::info!(records = records.len(), "History batch cancelled");
        }

        let discovered_paths = discover_paths(&records);
        ProcessedBatch {
            records,
            discovered_paths,
            cancelled,
        }
    }

    /// Parse one block. A panic inside the parser degrades the block to one
    /// raw record per line.
    fn parse_block<S: AsRef<str>>(&self, block: &[S]) -> Vec<LogRecord> {
        let lines = || block.iter().map(AsRef::as_ref);

        match panic::catch_unwind(AssertUnwindSafe(|| {
            lines().map(|line| self.parser.parse_line(line)).collect()
        })) {
            Ok(records) => records,
            Err(_) => {
                tracing::warn!(lines = block.len(), "Parser panicked; keeping block as raw lines");
                lines().map(LogRecord::raw).collect()
            }
        }
    }

    /// Render already-parsed history block by block.
    ///
    /// Uses the same sequential/concurrent rule as loading; output order
    /// matches history order and filtered records are dropped.
    pub fn format_history(
        &self,
        records: &[Arc<LogRecord>],
        formatter: &RecordFormatter,
        filter: &FilterTree,
    ) -> Vec<StyledFragment> {
        let concurrent = self.options.concurrent_for(records.len());
        let render = |block: &[Arc<LogRecord>]| {
            formatter.format_block(block.iter().map(|record| record.as_ref()), filter)
        };

        let blocks: Vec<Vec<StyledFragment>> = match self.pool_for(concurrent) {
            Some(pool) => pool.install(|| {
                records
                    .par_chunks(self.options.block_size())
                    .map(render)
                    .collect()
            }),
            None => records.chunks(self.options.block_size()).map(render).collect(),
        };
        blocks.into_iter().flatten().collect()
    }

    /// A bounded pool when `concurrent`, or `None` to stay on the caller
    fn pool_for(&self, concurrent: bool) -> Option<ThreadPool> {
        if !concurrent {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.worker_cap.max(1))
            .thread_name(|idx| format!("logconsole-batch-{idx}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build batch pool; processing sequentially");
                None
            }
        }
    }
}

fn discover_paths(records: &[LogRecord]) -> Vec<Vec<String>> {
    let mut seen: HashSet<&[String]> = HashSet::new();
    records
        .iter()
        .map(|record| record.source_path.as_slice())
        .filter(|path| !path.is_empty() && seen.insert(*path))
        .map(<[String]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayConfig;

    fn sample_lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| match i % 7 {
                0 => format!("free text line {i}"),
                3 => String::new(),
                _ => format!(
                    "2024-02-{:02} 12:{:02}:{:02}.{:03} INFO Module{}::fn{} >> message {i}",
                    1 + i % 28,
                    i % 60,
                    (i / 60) % 60,
                    i % 1000,
                    i % 5,
                    i % 3
                ),
            })
            .collect()
    }

    fn processor(mode: ExecutionMode) -> BatchProcessor {
        BatchProcessor::new(LineParser::default(), BatchOptions::default().with_mode(mode))
    }

    #[test]
    fn test_sequential_and_concurrent_agree() {
        let lines = sample_lines(2000);
        let sequential = processor(ExecutionMode::Sequential).process_file(&lines);
        let concurrent = processor(ExecutionMode::Concurrent).process_file(&lines);
        let auto = processor(ExecutionMode::Auto).process_file(&lines);

        assert_eq!(sequential, concurrent);
        assert_eq!(sequential, auto);
        assert!(!sequential.cancelled);
    }

    #[test]
    fn test_empty_lines_are_kept_as_raw_records() {
        let lines = sample_lines(70);
        let batch = processor(ExecutionMode::Auto).process_file(&lines);
        assert_eq!(batch.records.len(), 70);
        assert_eq!(batch.records[0].message, "free text line 0");
        assert!(batch.records[0].raw_only);
        assert_eq!(batch.records[1].message, "message 1");
        assert!(batch.records[3].raw_only);
        assert_eq!(batch.records[3].message, "");

        for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
            let batch = processor(mode).process_file(&["a", "", "b"]);
            let messages: Vec<&str> = batch.records.iter().map(|r| r.message.as_str()).collect();
            assert_eq!(messages, ["a", "", "b"]);
        }
    }

    #[test]
    fn test_discovered_paths_in_first_seen_order() {
        let lines = [
            "2024-01-01 00:00:00 INFO B::x >> 1",
            "2024-01-01 00:00:00 INFO A >> 2",
            "2024-01-01 00:00:00 INFO B::x >> 3",
            "2024-01-01 00:00:00 INFO >> no path",
            "raw",
        ];
        let batch = processor(ExecutionMode::Sequential).process_file(&lines);
        assert_eq!(
            batch.discovered_paths,
            vec![vec!["B".to_string(), "x".to_string()], vec!["A".to_string()]]
        );

        let mut filter = FilterTree::new();
        batch.register_paths(&mut filter);
        assert!(filter.find(&["B", "x"]).is_some());
        assert_eq!(filter.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let lines: [&str; 0] = [];
        let batch = processor(ExecutionMode::Concurrent).process_file(&lines);
        assert!(batch.records.is_empty());
        assert!(!batch.cancelled);
    }

    #[test]
    fn test_cancelled_before_start_returns_nothing() {
        let lines = sample_lines(200);
        let cancel = AtomicBool::new(true);
        for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
            let batch = processor(mode).process_cancellable(&lines, &cancel);
            assert!(batch.cancelled);
            assert!(batch.records.is_empty());
        }
    }

    struct Explosive;

    impl Parseable for Explosive {
        fn parse_line(&self, line: &str) -> LogRecord {
            if line.contains("boom") {
                panic!("parser blew up");
            }
            LineParser::parse(line)
        }
    }

    #[test]
    fn test_panicking_block_degrades_to_raw() {
        let mut lines = sample_lines(150);
        lines[60] = "2024-01-01 00:00:00 INFO X >> boom".to_string();
        let options = BatchOptions::default().with_mode(ExecutionMode::Concurrent);
        let batch = BatchProcessor::new(Explosive, options).process_file(&lines);

        let expected = processor(ExecutionMode::Sequential).process_file(&lines);
        assert_eq!(batch.records.len(), expected.records.len());
        // second block (lines 50..100) is raw, the others are parsed
        assert!(!expected.records[55].raw_only);
        assert!(batch.records[55].raw_only);
        assert_eq!(batch.records[55].message, lines[55]);
        assert_eq!(batch.records[1], expected.records[1]);
        assert_eq!(batch.records.last(), expected.records.last());
    }

    #[test]
    fn test_format_history_matches_sequential() {
        let lines = sample_lines(1600);
        let batch = processor(ExecutionMode::Sequential).process_file(&lines);
        let history: Vec<Arc<LogRecord>> = batch.records.into_iter().map(Arc::new).collect();

        let mut filter = FilterTree::new();
        filter.add_path(&["Module1"]);
        filter.add_path(&["Module2"]);
        filter.set_leaf_state(&["Module2"], false);
        let formatter = RecordFormatter::new(DisplayConfig::default());

        let sequential =
            processor(ExecutionMode::Sequential).format_history(&history, &formatter, &filter);
        let auto = processor(ExecutionMode::Auto).format_history(&history, &formatter, &filter);
        assert_eq!(sequential, auto);
        assert!(sequential.len() < history.len());
        assert!(sequential.iter().all(|f| !f.text().contains("Module2")));
    }
}
