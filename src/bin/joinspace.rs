//! Joinspace REPL - Interactive environment for hypergraph joins
//!
//! Usage: joinspace [source_files...]
//!
//! Commands:
//!   :help       - Show help
//!   :quit       - Exit REPL
//!   :load FILE  - Load and execute a source file
//!   :list       - List every atom in the store
//!   :roots      - List root atoms
//!   :type NAME  - List atoms of a named type
//!   :clear      - Reset the store

use std::fs;
use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use joinspace::repl::{ExecuteResult, InputResult, MetaCommand, ReplState};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const PROMPT: &str = "joinspace> ";
const CONTINUATION: &str = ".........  ";

/// Parse command line arguments.
///
/// Usage: joinspace [source_files...]
///
/// Options:
///   -h, --help         Show help and exit
///   -V, --version      Show version and exit
///
/// Returns the source files to load on startup, in order.
fn parse_args(args: &[String]) -> Vec<PathBuf> {
    let mut source_files = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("joinspace v{} - Hypergraph Join REPL", VERSION);
                println!();
                println!("Usage: joinspace [OPTIONS] [source_files...]");
                println!();
                println!("Options:");
                println!("  -h, --help         Show this help message");
                println!("  -V, --version      Show version");
                println!();
                println!("Examples:");
                println!("  joinspace                  Start an empty REPL");
                println!("  joinspace beach.joinspace  Load beach.joinspace on startup");
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("joinspace v{}", VERSION);
                std::process::exit(0);
            }
            _ if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                eprintln!("Try 'joinspace --help' for usage information");
                std::process::exit(2);
            }
            _ => {
                source_files.push(PathBuf::from(arg));
            }
        }
    }

    source_files
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let source_files = parse_args(&args);

    println!("joinspace v{} - Hypergraph Join REPL", VERSION);
    println!("Type :help for help, :quit to exit\n");

    let mut state = ReplState::new();

    // Load any source files specified on command line
    for source_file in &source_files {
        handle_load(&mut state, source_file);
    }

    // Set up rustyline
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> =
        Editor::with_config(config).expect("Failed to create editor");

    let history_path = dirs_history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    // Main REPL loop
    loop {
        let prompt = if state.input_buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION
        };

        match rl.readline(prompt) {
            Ok(line) => {
                match state.process_line(&line) {
                    InputResult::MetaCommand(cmd) => {
                        if !handle_command(&mut state, cmd) {
                            break; // :quit
                        }
                    }
                    InputResult::Source(source) => {
                        handle_source(&mut state, &source);
                    }
                    InputResult::Incomplete => {
                        // Continue reading
                    }
                    InputResult::Empty => {
                        // Nothing to do
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C - clear current buffer
                if !state.input_buffer.is_empty() {
                    state.input_buffer.clear();
                    state.paren_depth = 0;
                    println!("^C");
                } else {
                    println!("Use :quit or Ctrl-D to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D - submit buffer or quit
                if let Some(source) = state.force_submit() {
                    handle_source(&mut state, &source);
                } else {
                    println!("\nGoodbye!");
                    break;
                }
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }
}

/// Handle a meta-command. Returns false if we should exit.
fn handle_command(state: &mut ReplState, cmd: MetaCommand) -> bool {
    match cmd {
        MetaCommand::Help => {
            print_help();
        }
        MetaCommand::Quit => {
            println!("Goodbye!");
            return false;
        }
        MetaCommand::Load(path) => {
            handle_load(state, &path);
        }
        MetaCommand::List => {
            let atoms = state.list_atoms();
            if atoms.is_empty() {
                println!("Store is empty.");
            } else {
                println!("Atoms ({}):", atoms.len());
                for (id, text) in atoms {
                    println!("  [{}] {}", id, text);
                }
            }
        }
        MetaCommand::Roots => {
            let roots = state.list_roots();
            if roots.is_empty() {
                println!("No roots.");
            } else {
                println!("Roots ({}):", roots.len());
                for text in roots {
                    println!("  {}", text);
                }
            }
        }
        MetaCommand::Type(name) => match state.list_of_type(&name) {
            Ok(atoms) => {
                if atoms.is_empty() {
                    println!("No atoms of type '{}'.", name);
                } else {
                    println!("Atoms of type '{}' ({}):", name, atoms.len());
                    for text in atoms {
                        println!("  {}", text);
                    }
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
            }
        },
        MetaCommand::Clear => {
            state.reset();
            println!("Store cleared.");
        }
        MetaCommand::Unknown(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Type :help for available commands");
        }
    }
    true
}

/// Handle source input: parse, intern, execute any Join or Meet links.
fn handle_source(state: &mut ReplState, source: &str) {
    match state.execute_source(source) {
        Ok(results) => print_results(&results),
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }
}

/// Handle the :load command and startup source files.
fn handle_load(state: &mut ReplState, path: &PathBuf) {
    println!("Loading {}...", path.display());
    match state.load_file(path) {
        Ok(results) => print_results(&results),
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }
}

fn print_results(results: &[ExecuteResult]) {
    for result in results {
        match result {
            ExecuteResult::Join { containers } => {
                if containers.is_empty() {
                    println!("No containers.");
                } else {
                    println!("Containers ({}):", containers.len());
                    for text in containers {
                        println!("  {}", text);
                    }
                }
            }
            ExecuteResult::Meet { vars, tuples } => {
                if tuples.is_empty() {
                    println!("No matches.");
                } else {
                    println!("Matches for ({}):", vars.join(", "));
                    for tuple in tuples {
                        println!("  ({})", tuple.join(", "));
                    }
                }
            }
            ExecuteResult::Atom { id, text } => {
                println!("[{}] {}", id, text);
            }
        }
    }
}

/// Print help message
fn print_help() {
    println!("Joinspace REPL Commands:");
    println!();
    println!("  :help            Show this help message");
    println!("  :quit            Exit the REPL");
    println!("  :load <file>     Load and execute a source file");
    println!("  :list            List every atom in the store");
    println!("  :roots           List root atoms (nothing links to them)");
    println!("  :type <name>     List atoms of a type, subtypes included");
    println!("  :clear           Reset the store");
    println!();
    println!("Enter atoms directly as s-expressions:");
    println!("  (Member (Concept \"sand\") (Concept \"beach\"))");
    println!();
    println!("Join and Meet links execute when entered:");
    println!("  (Join (Variable \"X\")");
    println!("        (Present (Member (Variable \"X\") (Concept \"beach\"))))");
    println!();
    println!("Multi-line input is supported - parens are matched automatically.");
}

/// Get the history file path
fn dirs_history_path() -> Option<PathBuf> {
    if let Some(config_dir) = dirs_config_dir() {
        let mut path = config_dir;
        path.push("joinspace");
        path.push("history");
        return Some(path);
    }
    None
}

/// Get the config directory (cross-platform)
fn dirs_config_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(|h| {
            let mut p = PathBuf::from(h);
            p.push(".config");
            p
        })
    }
    #[cfg(windows)]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
