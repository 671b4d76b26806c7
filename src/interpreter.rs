//! Interpreter session: the host embedding surface.
//!
//! An `Interpreter` owns one global table, one coroutine registry and the
//! main thread. Host entry points run on the main thread and are refused
//! while any coroutine of the session is running.

use crate::config::Config;
use crate::context::Context;
use crate::coroutine::{CloseResult, Coroutine, Registry, ResumeResult};
use crate::error::{LError, LResult};
use crate::primitives::coroutines::spawn;
use crate::primitives::{register_primitives, PrimitiveDocs};
use crate::reader;
use crate::value::{Function, LuaClosure, Returns, TableRef, Value, Values};
use log::debug;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Everything a running script can reach, shared by every context of
/// the session.
pub struct State {
    pub config: Config,
    pub globals: TableRef,
    pub registry: Registry,
    /// Where `print` writes.
    pub output: RefCell<Box<dyn Write>>,
    pub docs: PrimitiveDocs,
}

pub struct Interpreter {
    state: Rc<State>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let globals = TableRef::new();
        let docs = register_primitives(&globals);
        debug!(
            "interpreter: {} primitives, {} byte coroutine stacks, max depth {}",
            docs.len(),
            config.coroutine_stack_size,
            config.max_call_depth
        );
        Interpreter {
            state: Rc::new(State {
                config,
                globals,
                registry: Registry::new(),
                output: RefCell::new(Box::new(io::stdout())),
                docs,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    fn main_context(&self) -> LResult<Context<'static>> {
        if !self.state.registry.is_idle() {
            return Err(LError::runtime("interpreter is busy"));
        }
        Ok(Context::main(self.state.clone()))
    }

    /// Compile a chunk named after the configured chunk name.
    pub fn load(&self, source: &str) -> LResult<Value> {
        self.load_named(source, &self.state.config.chunk_name)
    }

    /// Compile `source` into a vararg function without running it.
    pub fn load_named(&self, source: &str, chunk: &str) -> LResult<Value> {
        let proto = reader::parse(source, chunk)?;
        Ok(Value::Function(Function::Lua(Rc::new(LuaClosure {
            proto,
            upvalues: Box::new([]),
        }))))
    }

    /// Compile and run a chunk, returning its raw results.
    pub fn eval(&self, source: &str) -> LResult<Values> {
        let chunk = self.load(source)?;
        self.call(&chunk, Values::new())
    }

    /// Compile and run a chunk under an explicit chunk name.
    pub fn eval_named(&self, source: &str, chunk: &str) -> LResult<Values> {
        let chunk = self.load_named(source, chunk)?;
        self.call(&chunk, Values::new())
    }

    /// Like `eval`, shaped for the host: nothing, one value, or several.
    pub fn exec(&self, source: &str) -> LResult<Returns> {
        self.eval(source).map(Returns::from)
    }

    pub fn call(&self, func: &Value, args: Values) -> LResult<Values> {
        let cx = self.main_context()?;
        cx.call(func, args)
    }

    pub fn get_global(&self, name: &str) -> Value {
        self.state.globals.get_str(name)
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.state.globals.set_str(name, value);
    }

    /// Expose a host function as a global.
    pub fn register_native(
        &self,
        name: &str,
        func: impl Fn(&Context<'_>, Values) -> LResult<Values> + 'static,
    ) {
        self.set_global(name, Value::native(name, func));
    }

    /// Redirect `print`.
    pub fn set_output(&self, output: Box<dyn Write>) {
        *self.state.output.borrow_mut() = output;
    }

    pub fn main_thread(&self) -> Coroutine {
        self.state.registry.main().clone()
    }

    pub fn create_coroutine(&self, func: &Value) -> LResult<Coroutine> {
        let cx = self.main_context()?;
        match func {
            Value::Function(f) => Ok(spawn(&cx, f.clone())),
            other => Err(LError::type_expected(1, "create", "function", Some(other))),
        }
    }

    /// Resume `co` from the main thread.
    pub fn resume(&self, co: &Coroutine, args: Values) -> LResult<ResumeResult> {
        let cx = self.main_context()?;
        co.resume(&cx, args)
    }

    pub fn close(&self, co: &Coroutine) -> LResult<CloseResult> {
        let cx = self.main_context()?;
        co.close(&cx)
    }

    /// Every coroutine of the session still referenced somewhere, by id.
    pub fn coroutines(&self) -> Vec<Coroutine> {
        self.state.registry.live()
    }

    /// Help text for a built-in, e.g. `coroutine.wrap`.
    pub fn doc(&self, name: &str) -> Option<String> {
        self.state.docs.get(name).map(|def| def.format_doc())
    }

    /// Qualified names of every built-in, sorted.
    pub fn builtins(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.docs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Parked coroutine stacks hold the state alive; emptying the
        // globals releases every coroutine only reachable from scripts.
        self.state.globals.clear();
    }
}
