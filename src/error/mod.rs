//! Unified error system
//!
//! Two channels leave a library call: an `Err(LError)` raised to the
//! immediate caller, or a tagged `false, err` result built by the library
//! itself (`resume`, `close`, `pcall`). `LError::into_value` is the bridge
//! from the first to the second.

mod builders;
mod types;

pub use crate::reader::SourceLoc;
pub use types::{ErrorKind, LError, LResult};
