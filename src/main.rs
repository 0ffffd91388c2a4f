//! Render a log file to the terminal with the console's filtering and colors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use logconsole::batch::{BatchOptions, ExecutionMode};
use logconsole::console::LogConsole;
use logconsole::filter::{CheckState, FilterTree, NodeId};
use logconsole::format::StyledFragment;
use logconsole::parsers::{split_path, Level};

#[derive(Parser, Debug)]
#[command(name = "logconsole")]
#[command(about = "Render a console log file with filtering and colors")]
struct Args {
    #[arg(help = "Log file to load (.log or .txt)")]
    file: PathBuf,

    #[arg(long, help = "Settings file to load before rendering")]
    settings: Option<PathBuf>,

    #[arg(long, help = "Write the resulting settings to this file")]
    save_settings: Option<PathBuf>,

    #[arg(long, help = "Show the date field")]
    date: bool,

    #[arg(long, help = "Show the level field")]
    level: bool,

    #[arg(long, help = "Hide the time field")]
    no_time: bool,

    #[arg(long, help = "Hide milliseconds")]
    no_millis: bool,

    #[arg(long, help = "Hide the source path")]
    no_source: bool,

    #[arg(long, help = "Color whole lines by level instead of per field")]
    flat: bool,

    #[arg(long, help = "Print plain text without colors")]
    plain: bool,

    #[arg(long = "hide-level", value_name = "LEVEL", help = "Hide a level (repeatable)")]
    hide_levels: Vec<String>,

    #[arg(long, value_name = "PATH", help = "Disable a source path such as Net::tcp (repeatable)")]
    disable: Vec<String>,

    #[arg(long, help = "Print the source tree after the log")]
    tree: bool,

    #[arg(long, value_name = "QUERY", help = "Only show tree branches matching QUERY")]
    search: Option<String>,

    #[arg(long, help = "Parse on the calling thread only")]
    sequential: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mode = if args.sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Auto
    };
    let console = LogConsole::new(Default::default(), BatchOptions::default().with_mode(mode));

    if let Some(path) = &args.settings {
        console
            .load_settings(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    }

    let mut config = console.config();
    config.fields.date |= args.date;
    config.fields.level |= args.level;
    config.fields.time &= !args.no_time;
    config.fields.time_millis &= !args.no_millis;
    config.fields.source &= !args.no_source;
    config.extended_colors &= !args.flat;
    for token in &args.hide_levels {
        config.levels.set(Level::from_token(token), false);
    }
    console.set_config(config);

    let load = console
        .load_history_file(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let fragments = if args.disable.is_empty() {
        load.fragments
    } else {
        for path in &args.disable {
            if !console.set_filter_leaf(&split_path(path), false) {
                eprintln!("{} unknown source path: {}", "warning:".yellow(), path);
            }
        }
        console.rebuild_view()
    };

    for fragment in &fragments {
        println!("{}", render(fragment, args.plain));
    }
    eprintln!(
        "{} records, {} shown, {} sources",
        load.records,
        fragments.len(),
        load.discovered_paths
    );

    if args.tree || args.search.is_some() {
        console.with_filter(|filter| {
            filter.sort_by_name();
            if let Some(query) = &args.search {
                let matches = filter.search(query);
                eprintln!("{matches} matching nodes");
            }
        });
        let filter = console.filter_snapshot();
        print_tree(&filter, filter.root(), 0, args.search.is_some());
    }

    if let Some(path) = &args.save_settings {
        console
            .save_settings(path)
            .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    }

    Ok(())
}

fn render(fragment: &StyledFragment, plain: bool) -> String {
    if plain {
        return fragment.text();
    }
    fragment
        .runs
        .iter()
        .map(|run| {
            let fg = run.foreground;
            let text = run.text.truecolor(fg.r(), fg.g(), fg.b());
            match run.background {
                Some(bg) => text.on_truecolor(bg.r(), bg.g(), bg.b()).to_string(),
                None => text.to_string(),
            }
        })
        .collect()
}

fn print_tree(filter: &FilterTree, id: NodeId, depth: usize, searched: bool) {
    for &child in filter.children(id) {
        let Some(node) = filter.node(child) else {
            continue;
        };
        if searched && node.is_hidden() {
            continue;
        }
        let mark = match node.state() {
            CheckState::Enabled => "[x]",
            CheckState::Disabled => "[ ]",
            CheckState::PartiallyEnabled => "[~]",
        };
        println!("{}{} {}", "  ".repeat(depth), mark, node.name());
        if !searched || node.is_expanded() {
            print_tree(filter, child, depth + 1, searched);
        }
    }
}
