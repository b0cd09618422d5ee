// ABOUTME: Command-line entry point — file-or-REPL driver over the reader and evaluator

use cellscheme::config::{
    DEFAULT_MAX_CELLS, DEFAULT_MAX_SINK_SIZE, HELP_TEXT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE,
};
use cellscheme::eval::eval;
use cellscheme::heap::Heap;
use cellscheme::primitives;
use cellscheme::printer::print_to_string;
use cellscheme::reader::Reader;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use std::process::ExitCode;

/// A tagged-cell Scheme interpreter with mark-sweep GC and proper tail calls
#[derive(Parser, Debug)]
#[command(name = "cellscheme")]
#[command(version = VERSION)]
#[command(about = "A tagged-cell Scheme interpreter with mark-sweep GC and tail calls")]
#[command(long_about = HELP_TEXT)]
struct Args {
    /// Source file to read and evaluate; with no argument, starts a REPL on stdin
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Arena capacity, in cells
    #[arg(long = "max-cells", value_name = "N", default_value_t = DEFAULT_MAX_CELLS)]
    max_cells: usize,

    /// Sink capacity, in cells
    #[arg(long = "max-sink", value_name = "N", default_value_t = DEFAULT_MAX_SINK_SIZE)]
    max_sink: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let mut heap = Heap::new(args.max_cells, args.max_sink);
    primitives::install(&mut heap);

    match args.script {
        Some(path) => run_file(&mut heap, &path),
        None => run_repl(&mut heap),
    }
}

/// Reads and evaluates every top-level form in `path` in order; exits `0`
/// on clean completion, `1` on a reader error (fatal arena exhaustion exits
/// the process directly from `Heap::collect`).
fn run_file(heap: &mut Heap, path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut remaining: &str = &source;
    loop {
        let next_object = {
            let mut reader = Reader::new(remaining, heap);
            let result = reader.read_object();
            (result, reader.remaining())
        };
        match next_object {
            (Ok(None), _) => return ExitCode::SUCCESS,
            (Ok(Some(obj)), rest) => {
                remaining = rest;
                eval(heap, obj);
            }
            (Err(e), _) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }
}

/// Interactive read-eval-print loop over stdin, line-edited with
/// `rustyline`. Each evaluated result is printed followed by a newline;
/// a reader error is reported and the loop continues with the next line
/// rather than exiting.
fn run_repl(heap: &mut Heap) -> ExitCode {
    println!("{WELCOME_MESSAGE} — {WELCOME_SUBTITLE}");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("failed to initialize line editor: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { "> " } else { ".. " };
        match rl.readline(prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                pending.push_str(&line);
                pending.push('\n');

                // Read within its own block so the reader's borrow of `heap`
                // ends before `eval` needs to reborrow it mutably.
                let (read_result, rest) = {
                    let mut reader = Reader::new(&pending, heap);
                    let read_result = reader.read_object();
                    let rest = reader.remaining().to_string();
                    (read_result, rest)
                };

                match read_result {
                    Ok(None) => pending.clear(),
                    Ok(Some(obj)) => {
                        let result = eval(heap, obj);
                        println!("{}", print_to_string(heap, result));
                        // `rest` is usually just the newline after the form's
                        // closing paren; trim it so the primary prompt
                        // returns instead of looking like an open list.
                        pending = rest.trim_start().to_string();
                    }
                    Err(cellscheme::error::ReaderError::UnterminatedList) => {
                        // Still-open list: keep buffering more lines.
                    }
                    Err(e) => {
                        eprintln!("{e}");
                        pending.clear();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => return ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }
}
