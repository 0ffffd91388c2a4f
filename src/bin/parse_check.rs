use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use strum::IntoEnumIterator;

// Import from the library
use logconsole::batch::{BatchOptions, BatchProcessor, ExecutionMode};
use logconsole::filter::FilterTree;
use logconsole::parsers::{encoding, Level, LineParser};

#[derive(Parser, Debug)]
#[command(name = "parse_check")]
#[command(about = "Parse a console log file and print statistics")]
struct Args {
    #[arg(help = "Log file to parse")]
    file: PathBuf,

    #[arg(long, default_value_t = 5, help = "Number of sample records to print")]
    samples: usize,

    #[arg(long, help = "Compare sequential and concurrent parsing")]
    compare: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Reading file: {}", args.file.display());
    let contents = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    println!("File size: {} bytes", contents.len());

    let lines: Vec<&str> = contents.lines().collect();
    let encoded = lines.iter().filter(|l| encoding::decode_line(l).is_some()).count();
    println!("Lines: {} ({} encoded)", lines.len(), encoded);

    let processor = BatchProcessor::new(LineParser::default(), BatchOptions::default());
    let started = Instant::now();
    let batch = processor.process_file(&lines);
    println!("Parsed in {:.2?}", started.elapsed());

    println!("\n=== Parse Results ===");
    let raw = batch.records.iter().filter(|r| r.raw_only).count();
    let undated = batch
        .records
        .iter()
        .filter(|r| !r.raw_only && r.timestamp.is_none())
        .count();
    println!("Records: {}", batch.records.len());
    println!("Raw lines: {}", raw);
    println!("Structured without timestamp: {}", undated);
    println!("Distinct sources: {}", batch.discovered_paths.len());

    let mut per_level: BTreeMap<Level, usize> = BTreeMap::new();
    for record in batch.records.iter().filter(|r| !r.raw_only) {
        *per_level.entry(record.level).or_default() += 1;
    }
    println!("\n=== Levels ===");
    for level in Level::iter() {
        println!("  {:<8} {}", level.tag(), per_level.get(&level).unwrap_or(&0));
    }

    let timestamps: Vec<_> = batch.records.iter().filter_map(|r| r.timestamp).collect();
    if let (Some(first), Some(last)) = (timestamps.iter().min(), timestamps.iter().max()) {
        println!("\nTime range: {} to {}", first, last);
    }

    let mut filter = FilterTree::new();
    batch.register_paths(&mut filter);
    filter.sort_by_name();
    println!("\n=== Top-level sources ===");
    for &child in filter.children(filter.root()) {
        if let Some(node) = filter.node(child) {
            println!("  {} ({} below)", node.name(), filter.descendants(child).len());
        }
    }

    println!("\n=== First {} records ===", args.samples);
    for record in batch.records.iter().take(args.samples) {
        println!("  {}", record);
    }

    if args.compare {
        let sequential = BatchProcessor::new(
            LineParser::default(),
            BatchOptions::default().with_mode(ExecutionMode::Sequential),
        );
        let concurrent = BatchProcessor::new(
            LineParser::default(),
            BatchOptions::default().with_mode(ExecutionMode::Concurrent),
        );

        let started = Instant::now();
        let a = sequential.process_file(&lines);
        let sequential_time = started.elapsed();
        let started = Instant::now();
        let b = concurrent.process_file(&lines);
        let concurrent_time = started.elapsed();

        println!("\n=== Sequential vs concurrent ===");
        println!("Sequential: {:.2?}", sequential_time);
        println!("Concurrent: {:.2?}", concurrent_time);
        if a == b {
            println!("Outputs identical");
        } else {
            anyhow::bail!("sequential and concurrent outputs differ");
        }
    }

    println!("\n=== Success! Parser working correctly ===");
    Ok(())
}
