//! Handoff channel between a resumer and a coroutine.
//!
//! Every coroutine body runs on its own machine stack. `Task::resume`
//! switches onto that stack and blocks until the body either suspends
//! through its `Yielder` or returns. Values cross in both directions
//! exactly once per switch.

use crate::error::LResult;
use crate::value::Values;
use corosensei::stack::DefaultStack;
use corosensei::{Coroutine as StackfulCoroutine, CoroutineResult};
use std::io;

/// The coroutine side of the channel.
pub type Yielder = corosensei::Yielder<Values, Values>;

/// What a resume got back.
pub enum Handoff {
    /// The body suspended with these values.
    Yielded(Values),
    /// The body ran to completion.
    Finished(LResult<Values>),
}

/// A started or startable body on its own stack.
///
/// Dropping a task that is parked mid-body unwinds its stack, running
/// Rust destructors only.
pub struct Task {
    inner: StackfulCoroutine<Values, Values, LResult<Values>, DefaultStack>,
}

impl Task {
    /// Allocate a stack of `stack_size` bytes and bind `entry` to it.
    /// `entry` receives the first resume's values.
    pub fn spawn<F>(stack_size: usize, entry: F) -> io::Result<Task>
    where
        F: FnOnce(&Yielder, Values) -> LResult<Values> + 'static,
    {
        let stack = DefaultStack::new(stack_size)?;
        Ok(Task {
            inner: StackfulCoroutine::with_stack(stack, entry),
        })
    }

    pub fn resume(&mut self, input: Values) -> Handoff {
        match self.inner.resume(input) {
            CoroutineResult::Yield(values) => Handoff::Yielded(values),
            CoroutineResult::Return(result) => Handoff::Finished(result),
        }
    }
}
