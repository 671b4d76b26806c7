//! # Coluna - stackful coroutines for a small Lua-family interpreter
//!
//! Coluna runs a Lua 5.4 subset with a tree-walking evaluator. Every
//! coroutine gets its own machine stack, so `coroutine.yield` can suspend
//! from any call depth, including from inside host functions.
//!
//! ## Quick Start
//!
//! ```
//! use coluna::{Interpreter, Value};
//!
//! let interp = Interpreter::new();
//! let values = interp
//!     .eval(
//!         "local co = coroutine.create(function(a, b)
//!              local c = coroutine.yield(a + b)
//!              return c * 2
//!          end)
//!          local _, x = coroutine.resume(co, 1, 2)
//!          local _, y = coroutine.resume(co, 10)
//!          return x, y, coroutine.status(co)",
//!     )
//!     .unwrap();
//! assert_eq!(values[0], Value::Int(3));
//! assert_eq!(values[1], Value::Int(20));
//! assert_eq!(values[2], Value::string("dead"));
//! ```
//!
//! ## Architecture
//!
//! 1. **Reader** - Lex and parse source into a resolved syntax tree
//! 2. **VM** - Evaluate the tree against a `Context`
//! 3. **Coroutine** - Stackful tasks, their status machine and registry
//! 4. **Primitives** - The base, `coroutine` and `table` libraries

pub mod config;
pub mod context;
pub mod coroutine;
pub mod error;
pub mod interpreter;
pub mod primitives;
pub mod reader;
pub mod value;
pub mod vm;

pub use config::Config;
pub use context::Context;
pub use coroutine::{CloseResult, Coroutine, CoroutineError, ResumeResult, Status};
pub use error::{ErrorKind, LError, LResult};
pub use interpreter::Interpreter;
pub use primitives::register_primitives;
pub use value::{Returns, Value, Values};
