//! # minidb CLI
//!
//! Runs SQL against a minidb data directory, either interactively, from a
//! script file (optionally restricted to a line range), or in watch mode.

use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use minidb::shell::{LineRange, Shell};
use minidb::{Config, Database};

#[derive(Parser, Debug)]
#[command(name = "minidb", version, about = "A minimal single-user SQL database")]
struct Args {
    /// Execute the statements in FILE and exit.
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Only execute lines START-END (or START:END) of the script.
    #[arg(short = 'l', long, value_name = "RANGE", requires = "file")]
    lines: Option<LineRange>,

    /// Re-run FILE every time ENTER is pressed.
    #[arg(short = 'w', long, value_name = "FILE", conflicts_with_all = ["file", "lines"])]
    watch: Option<PathBuf>,

    /// Directory holding the catalog and table files.
    #[arg(short = 'd', long, env = "MINIDB_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Keep all data in memory; nothing is written to disk.
    #[arg(long)]
    memory: bool,
}

fn main() {
    let args = Args::try_parse().unwrap_or_else(|e| {
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        process::exit(code);
    });

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let db = if args.memory {
        Database::in_memory()
    } else {
        Database::open(&Config::new(args.data_dir.clone()))
            .unwrap_or_else(|e| fatal(format!("cannot open database: {e}")))
    };
    let mut shell = Shell::new(db);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    let result = if let Some(path) = &args.watch {
        shell
            .run_watch(path, stdin.lock(), &mut stdout)
            .map(|_| ())
    } else if let Some(path) = &args.file {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|e| fatal(format!("cannot open file {}: {e}", path.display())));
        let script = match args.lines {
            Some(range) => {
                let selected = range.select(&text).unwrap_or_else(|e| fatal(e));
                if selected.trim().is_empty() {
                    fatal(format!("no statements found in line range {range}"));
                }
                selected
            }
            None => text,
        };
        shell.run_script(script.as_bytes(), &mut stdout).map(|_| ())
    } else {
        println!("minidb v{}", env!("CARGO_PKG_VERSION"));
        println!("Enter \".help\" for usage hints.");
        match shell.database().data_dir() {
            Some(dir) => println!("Data directory: {}", dir.display()),
            None => println!("Connected to a transient in-memory database."),
        }
        shell.run_interactive(stdin.lock(), &mut stdout)
    };

    if let Err(e) = result.and_then(|()| stdout.flush()) {
        fatal(e);
    }
}

fn fatal(msg: impl Display) -> ! {
    eprintln!("Error: {msg}");
    process::exit(1);
}
