//! Primitive definition type for declarative registration.
//!
//! Each primitive module exports a `const PRIMITIVES: &[PrimitiveDef]`
//! table. `register_primitives` iterates all tables to install the
//! functions as globals or library fields and to build the doc index.

use crate::context::Context;
use crate::error::{LError, LResult};
use crate::value::Values;
use rustc_hash::FxHashMap;

/// Signature shared by every built-in function.
pub type PrimFn = fn(&Context<'_>, Values) -> LResult<Values>;

/// Declarative definition of a primitive function.
///
/// Adding a new metadata field means adding it here with a default;
/// existing tables use `..PrimitiveDef::DEFAULT`.
pub struct PrimitiveDef {
    /// Name inside its library (e.g., "resume", "insert", "print").
    /// Also the name used in `bad argument` messages.
    pub name: &'static str,
    /// The Rust implementation.
    pub func: PrimFn,
    /// Global table holding the function (e.g., "coroutine").
    /// Empty string for base functions, which are plain globals.
    pub library: &'static str,
    /// One-line description for REPL help.
    pub doc: &'static str,
    /// Parameter names for the signature line.
    pub params: &'static [&'static str],
}

impl PrimitiveDef {
    /// Default for struct-update syntax. `func` fails when called, which
    /// forces explicit initialization.
    pub const DEFAULT: PrimitiveDef = PrimitiveDef {
        name: "",
        func: default_prim,
        library: "",
        doc: "",
        params: &[],
    };

    /// Script-visible path, e.g. `coroutine.resume` or `print`.
    pub fn qualified_name(&self) -> String {
        if self.library.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.library, self.name)
        }
    }

    /// Human-readable help text for the REPL.
    pub fn format_doc(&self) -> String {
        let mut out = format!("{}({})\n", self.qualified_name(), self.params.join(", "));
        if !self.doc.is_empty() {
            out.push_str("  ");
            out.push_str(self.doc);
            out.push('\n');
        }
        out
    }
}

fn default_prim(_cx: &Context<'_>, _args: Values) -> LResult<Values> {
    Err(LError::runtime("primitive has no implementation"))
}

/// Registered primitives by qualified name.
pub type PrimitiveDocs = FxHashMap<String, &'static PrimitiveDef>;
