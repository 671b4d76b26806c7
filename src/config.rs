//! Interpreter configuration
//!
//! Limits that shape every session: how big a coroutine's machine stack is
//! how deep interpreted calls may nest inside one task, and how many
//! resumes may be in flight at once.

use log::warn;

/// Default machine stack for each coroutine (4 MiB, committed lazily).
pub const DEFAULT_STACK_SIZE: usize = 4 * 1024 * 1024;

/// Default limit on nested script calls within a single task.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Default limit on nested resumes. Each level holds its own stack.
pub const DEFAULT_MAX_RESUME_DEPTH: usize = 200;

/// Smallest stack we agree to allocate. Anything below this cannot hold
/// even a shallow evaluator frame chain.
pub const MIN_STACK_SIZE: usize = 64 * 1024;

pub const STACK_SIZE_VAR: &str = "COLUNA_STACK_SIZE";
pub const MAX_DEPTH_VAR: &str = "COLUNA_MAX_DEPTH";
pub const MAX_RESUMES_VAR: &str = "COLUNA_MAX_RESUMES";

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bytes reserved for each coroutine stack (default: 4 MiB)
    pub coroutine_stack_size: usize,
    /// Nested call limit per task before "stack overflow" (default: 200)
    pub max_call_depth: usize,
    /// Coroutines that may be running or normal at once (default: 200)
    pub max_resume_depth: usize,
    /// Name used in error locations for loaded chunks (default: "input")
    pub chunk_name: String,
}

impl Config {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self {
            coroutine_stack_size: DEFAULT_STACK_SIZE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_resume_depth: DEFAULT_MAX_RESUME_DEPTH,
            chunk_name: "input".to_string(),
        }
    }

    /// Defaults overridden by `COLUNA_STACK_SIZE`, `COLUNA_MAX_DEPTH` and
    /// `COLUNA_MAX_RESUMES`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(size) = read_var(STACK_SIZE_VAR) {
            config = config.with_stack_size(size);
        }
        if let Some(depth) = read_var(MAX_DEPTH_VAR) {
            config = config.with_max_call_depth(depth);
        }
        if let Some(depth) = read_var(MAX_RESUMES_VAR) {
            config = config.with_max_resume_depth(depth);
        }
        config
    }

    /// Set the coroutine stack size, clamped to `MIN_STACK_SIZE`
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.coroutine_stack_size = bytes.max(MIN_STACK_SIZE);
        self
    }

    /// Set the nested call limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    /// Set the nested resume limit
    pub fn with_max_resume_depth(mut self, depth: usize) -> Self {
        self.max_resume_depth = depth.max(1);
        self
    }

    /// Set the chunk name
    pub fn with_chunk_name(mut self, name: impl Into<String>) -> Self {
        self.chunk_name = name.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn read_var(name: &str) -> Option<usize> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring {}={:?}: not a non-negative integer", name, raw);
            None
        }
    }
}
