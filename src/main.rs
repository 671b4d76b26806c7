mod repl;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use coluna::{Config, Interpreter};
use std::path::PathBuf;

/// Run scripts with stackful coroutines.
#[derive(Parser, Debug)]
#[command(name = "coluna", version, about)]
struct Cli {
    /// Script files to run, in order
    files: Vec<PathBuf>,

    /// Execute a chunk given on the command line
    #[arg(short = 'e', long = "execute", value_name = "CHUNK")]
    execute: Vec<String>,

    /// Coroutine stack size in bytes (overrides COLUNA_STACK_SIZE)
    #[arg(long)]
    stack_size: Option<usize>,

    /// Maximum nested calls per coroutine (overrides COLUNA_MAX_DEPTH)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Maximum nested resumes (overrides COLUNA_MAX_RESUMES)
    #[arg(long)]
    max_resumes: Option<usize>,

    /// Enter the REPL after running the inputs
    #[arg(short, long)]
    interactive: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp(None)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(size) = cli.stack_size {
        config = config.with_stack_size(size);
    }
    if let Some(depth) = cli.max_depth {
        config = config.with_max_call_depth(depth);
    }
    if let Some(depth) = cli.max_resumes {
        config = config.with_max_resume_depth(depth);
    }
    let interp = Interpreter::with_config(config);

    for (i, chunk) in cli.execute.iter().enumerate() {
        let name = format!("(command line {})", i + 1);
        interp
            .eval_named(chunk, &name)
            .map_err(|e| anyhow!("{}", e))?;
    }

    for path in &cli.files {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let name = path.display().to_string();
        interp
            .eval_named(&source, &name)
            .map_err(|e| anyhow!("{}", e))?;
    }

    let ran_something = !cli.execute.is_empty() || !cli.files.is_empty();
    if !ran_something || cli.interactive {
        let mut repl = repl::Repl::new().context("cannot start line editor")?;
        repl.run(&interp).context("line editor failed")?;
    }
    Ok(())
}
