//! REPL (Read-Eval-Print Loop) with readline support
//!
//! Provides the interactive command-line interface with:
//! - Command history (persisted to disk)
//! - Multi-line input for unfinished statements
//! - `:help [name]` for built-in documentation

use coluna::{Interpreter, LError};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".coluna_history";
const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = ">> ";

/// REPL editor with readline support
pub struct Repl {
    editor: DefaultEditor,
}

impl Repl {
    /// Create a new REPL editor with readline support
    pub fn new() -> RustylineResult<Self> {
        let mut editor = DefaultEditor::new()?;

        // Load history from disk
        let history_path = Self::history_file_path();
        let _ = editor.load_history(&history_path);

        Ok(Self { editor })
    }

    /// Get the path to the history file
    fn history_file_path() -> PathBuf {
        if let Some(home) = dirs_home() {
            home.join(HISTORY_FILE)
        } else {
            PathBuf::from(HISTORY_FILE)
        }
    }

    fn save_history(&mut self) {
        let history_path = Self::history_file_path();
        let _ = self.editor.save_history(&history_path);
    }

    /// Run until end of input.
    pub fn run(&mut self, interp: &Interpreter) -> RustylineResult<()> {
        println!("coluna {}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for built-ins, Ctrl-D to quit");

        let mut buffer = String::new();
        loop {
            let prompt = if buffer.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            let line = match self.editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    buffer.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e),
            };

            if buffer.is_empty() {
                if let Some(topic) = line.trim().strip_prefix(":help") {
                    let _ = self.editor.add_history_entry(line.as_str());
                    show_help(interp, topic.trim());
                    continue;
                }
            }

            buffer.push_str(&line);
            buffer.push('\n');
            match eval_line(interp, &buffer) {
                Err(e) if is_incomplete(&e) => continue,
                Err(e) => eprintln!("{}", e),
                Ok(()) => {}
            }
            let _ = self.editor.add_history_entry(buffer.trim_end());
            buffer.clear();
        }

        self.save_history();
        Ok(())
    }
}

/// Evaluate one entry, printing its results. A bare expression is tried
/// as `return <expr>` first, so `1 + 2` shows `3`.
fn eval_line(interp: &Interpreter, source: &str) -> Result<(), LError> {
    let chunk = match interp.load_named(&format!("return {}", source), "stdin") {
        Ok(chunk) => chunk,
        Err(_) => interp.load_named(source, "stdin")?,
    };
    let values = interp.call(&chunk, Default::default())?;
    if !values.is_empty() {
        let shown: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
        println!("{}", shown.join("\t"));
    }
    Ok(())
}

/// The parser hit end of input before the statement finished.
fn is_incomplete(err: &LError) -> bool {
    err.is_syntax() && err.to_string().ends_with("near <eof>")
}

fn show_help(interp: &Interpreter, topic: &str) {
    if topic.is_empty() {
        println!("{}", interp.builtins().join(" "));
        return;
    }
    match interp.doc(topic) {
        Some(doc) => print!("{}", doc),
        None => println!("no built-in named '{}'", topic),
    }
}

/// Get home directory path (cross-platform)
fn dirs_home() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
