use crate::value::{TableRef, Value};

use super::def::{PrimitiveDef, PrimitiveDocs};
use super::{base, coroutines, table};

/// All primitive tables. Each module exports a `const PRIMITIVES`
/// array; this list is the single place that enumerates them.
pub(crate) const ALL_TABLES: &[&[PrimitiveDef]] = &[
    base::PRIMITIVES,
    coroutines::PRIMITIVES,
    table::PRIMITIVES,
];

/// Install every primitive into `globals` and return the doc index.
///
/// Base functions become globals; library functions become fields of a
/// global table named after the library, created on first use. `_G`
/// refers back to `globals`.
pub fn register_primitives(globals: &TableRef) -> PrimitiveDocs {
    let mut docs = PrimitiveDocs::default();

    for table in ALL_TABLES {
        for def in *table {
            let func = Value::native(def.name, def.func);
            if def.library.is_empty() {
                globals.set_str(def.name, func);
            } else {
                library_table(globals, def.library).set_str(def.name, func);
            }
            docs.insert(def.qualified_name(), def);
        }
    }

    globals.set_str("_G", Value::Table(globals.clone()));
    docs
}

fn library_table(globals: &TableRef, name: &str) -> TableRef {
    match globals.get_str(name) {
        Value::Table(t) => t,
        _ => {
            let t = TableRef::new();
            globals.set_str(name, Value::Table(t.clone()));
            t
        }
    }
}
