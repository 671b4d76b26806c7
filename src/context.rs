//! Execution context threaded through every call.
//!
//! A `Context` names the session and the coroutine whose stack the code is
//! running on. The main thread gets one context per host entry; every
//! coroutine body gets its own when its task starts, carrying the yielder
//! that suspends it. Nested calls borrow the caller's context.

use crate::config::Config;
use crate::coroutine::{Coroutine, CoroutineError, Registry, WeakCoroutine, Yielder};
use crate::error::{LError, LResult};
use crate::interpreter::State;
use crate::value::{Function, TableRef, Value, Values};
use crate::vm;
use log::trace;
use std::cell::Cell;
use std::rc::Rc;

pub struct Context<'a> {
    state: Rc<State>,
    thread: WeakCoroutine,
    yielder: Option<&'a Yielder>,
    depth: Cell<usize>,
}

/// Decrements the call depth when a call returns or unwinds.
pub struct CallGuard<'c> {
    depth: &'c Cell<usize>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl<'a> Context<'a> {
    /// Context for host entry on the main thread.
    pub fn main(state: Rc<State>) -> Context<'static> {
        let thread = state.registry.main().downgrade();
        Context {
            state,
            thread,
            yielder: None,
            depth: Cell::new(0),
        }
    }

    /// Context for a coroutine body running on its own stack.
    pub fn for_task(state: Rc<State>, thread: WeakCoroutine, yielder: &'a Yielder) -> Self {
        Context {
            state,
            thread,
            yielder: Some(yielder),
            depth: Cell::new(0),
        }
    }

    /// Same thread and depth, but `yield` fails. Used for cleanup hooks
    /// run by `close`.
    pub fn without_yield(&self) -> Context<'static> {
        Context {
            state: self.state.clone(),
            thread: self.thread.clone(),
            yielder: None,
            depth: Cell::new(self.depth.get()),
        }
    }

    pub fn state(&self) -> &Rc<State> {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn globals(&self) -> &TableRef {
        &self.state.globals
    }

    pub fn registry(&self) -> &Registry {
        &self.state.registry
    }

    pub fn main_thread(&self) -> &Coroutine {
        self.state.registry.main()
    }

    /// The coroutine this context executes on.
    pub fn current(&self) -> Coroutine {
        self.thread
            .upgrade()
            .unwrap_or_else(|| self.state.registry.current())
    }

    /// Hand `values` to the pending resume and block until resumed again.
    pub fn yield_values(&self, values: Values) -> LResult<Values> {
        let current = self.current();
        if current.is_main() {
            return Err(CoroutineError::YieldOutside.into());
        }
        let yielder = match self.yielder {
            Some(y) => y,
            None => return Err(CoroutineError::YieldAcrossBoundary.into()),
        };
        trace!("coroutine {}: yield {} value(s)", current.id(), values.len());
        // No strong handle may sit on a parked stack
        drop(current);
        Ok(yielder.suspend(values))
    }

    /// Count one nested call against `max_call_depth`.
    pub fn enter_call(&self) -> LResult<CallGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.state.config.max_call_depth {
            return Err(LError::stack_overflow());
        }
        self.depth.set(depth);
        Ok(CallGuard { depth: &self.depth })
    }

    pub fn call(&self, callee: &Value, args: Values) -> LResult<Values> {
        match callee {
            Value::Function(Function::Lua(closure)) => {
                let _guard = self.enter_call()?;
                vm::call_closure(self, closure, args)
            }
            Value::Function(Function::Native(native)) => {
                let _guard = self.enter_call()?;
                native.call(self, args)
            }
            other => Err(LError::runtime(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // To-be-closed values of the current thread
    // ------------------------------------------------------------------

    pub fn cleanup_mark(&self) -> usize {
        self.current().cleanup_len()
    }

    pub fn push_cleanup(&self, value: Value) {
        self.current().push_cleanup(value);
    }

    /// Close every value registered above `mark`, newest first. Each hook
    /// sees the error in flight (or nil); a failing hook replaces it.
    pub fn close_pending<T>(&self, mark: usize, mut result: LResult<T>) -> LResult<T> {
        loop {
            // Hooks may yield; no strong handle to the thread is held across them
            let value = match self.current().pop_cleanup_above(mark) {
                Some(value) => value,
                None => break,
            };
            let err = match &result {
                Ok(_) => Value::Nil,
                Err(e) => e.clone().into_value(),
            };
            if let Err(e) = vm::call_close_hook(self, &value, err) {
                result = Err(e);
            }
        }
        result
    }
}
