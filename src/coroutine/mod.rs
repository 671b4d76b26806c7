//! Coroutines
//!
//! A coroutine is a cooperatively scheduled task with its own machine
//! stack. Exactly one coroutine of a session runs at a time; the ones that
//! resumed it, transitively, are `Normal`; all others are suspended or
//! dead.
//!
//! `resume` has two failure channels. A call that cannot be honoured at
//! all (dead or running target, too many nested resumes, stack allocation
//! failure) is an `Err`
//! raised to the caller. A body that raises is reported as `Ok(Err(value))`
//! and leaves the coroutine dead.

mod registry;
mod scheduler;

pub use registry::Registry;
pub use scheduler::{Handoff, Task, Yielder};

use crate::context::Context;
use crate::error::{LError, LResult};
use crate::value::{LuaClosure, NativeFunction, Value, Values};
use crate::vm;
use log::{debug, trace, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

pub type CoroutineId = u64;

/// Outcome of a resume that reached the body: yielded or returned values,
/// or the error value the body raised.
pub type ResumeResult = Result<Values, Value>;

/// Outcome of `close`: success, or the first error raised by a cleanup
/// hook.
pub type CloseResult = Result<(), Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoroutineError {
    #[error("cannot resume running coroutine")]
    ResumeRunning,
    #[error("cannot resume non-suspended coroutine")]
    ResumeNonSuspended,
    #[error("cannot resume dead coroutine")]
    ResumeDead,
    #[error("C stack overflow")]
    ResumeOverflow,
    #[error("cannot close a running coroutine")]
    CloseRunning,
    #[error("cannot close a normal coroutine")]
    CloseNormal,
    #[error("attempt to yield from outside a coroutine")]
    YieldOutside,
    #[error("attempt to yield across a non-yieldable boundary")]
    YieldAcrossBoundary,
    #[error("cannot allocate coroutine stack: {0}")]
    StackAllocation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    NotStarted,
    Parked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Returned,
    Errored,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Suspended(Suspension),
    Running,
    Normal,
    Dead(Termination),
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Suspended(_) => "suspended",
            Status::Running => "running",
            Status::Normal => "normal",
            Status::Dead(_) => "dead",
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Status::Dead(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a coroutine runs.
#[derive(Clone)]
pub enum Body {
    Interpreted(Rc<LuaClosure>),
    Native(Rc<NativeFunction>),
}

impl Body {
    fn call(&self, cx: &Context<'_>, args: Values) -> LResult<Values> {
        match self {
            Body::Interpreted(closure) => vm::call_closure(cx, closure, args),
            Body::Native(native) => native.call(cx, args),
        }
    }
}

struct CoroutineData {
    id: CoroutineId,
    /// `None` for the main thread.
    body: Option<Body>,
    status: Cell<Status>,
    resumer: RefCell<Option<WeakCoroutine>>,
    /// Parked stack. Empty before the first resume, while the body runs,
    /// and once dead.
    task: RefCell<Option<Task>>,
    pending_cleanup: RefCell<Vec<Value>>,
}

/// Handle to a coroutine. Equality is identity.
#[derive(Clone)]
pub struct Coroutine(Rc<CoroutineData>);

/// Non-owning handle, used for resumer links and the registry index.
#[derive(Clone)]
pub struct WeakCoroutine(Weak<CoroutineData>);

impl WeakCoroutine {
    pub fn upgrade(&self) -> Option<Coroutine> {
        self.0.upgrade().map(Coroutine)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Coroutine {
    pub(crate) fn main(id: CoroutineId) -> Self {
        Self::with_status(id, None, Status::Running)
    }

    pub(crate) fn new(id: CoroutineId, body: Body) -> Self {
        Self::with_status(id, Some(body), Status::Suspended(Suspension::NotStarted))
    }

    fn with_status(id: CoroutineId, body: Option<Body>, status: Status) -> Self {
        Coroutine(Rc::new(CoroutineData {
            id,
            body,
            status: Cell::new(status),
            resumer: RefCell::new(None),
            task: RefCell::new(None),
            pending_cleanup: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> CoroutineId {
        self.0.id
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn is_main(&self) -> bool {
        self.0.body.is_none()
    }

    pub fn is_native(&self) -> bool {
        matches!(self.0.body, Some(Body::Native(_)))
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match &self.0.body {
            None => "main",
            Some(Body::Interpreted(_)) => "interpreted",
            Some(Body::Native(_)) => "native",
        }
    }

    /// The stored status.
    pub fn status(&self) -> Status {
        self.0.status.get()
    }

    /// Status as seen from `cx`: the executing coroutine is always
    /// running, whatever its stored field says.
    pub fn status_in(&self, cx: &Context<'_>) -> Status {
        if *self == cx.current() {
            Status::Running
        } else {
            self.status()
        }
    }

    /// The coroutine that resumed this one, while it runs.
    pub fn resumer(&self) -> Option<Coroutine> {
        self.0.resumer.borrow().as_ref().and_then(WeakCoroutine::upgrade)
    }

    pub fn downgrade(&self) -> WeakCoroutine {
        WeakCoroutine(Rc::downgrade(&self.0))
    }

    fn set_status(&self, status: Status) {
        let old = self.0.status.get();
        debug_assert!(!old.is_dead(), "dead coroutine {} changed status", self.0.id);
        self.0.status.set(status);
    }

    fn check_resumable(&self, caller: &Coroutine) -> LResult<()> {
        match self.status() {
            Status::Running => return Err(CoroutineError::ResumeRunning.into()),
            Status::Normal => return Err(CoroutineError::ResumeNonSuspended.into()),
            Status::Dead(_) => return Err(CoroutineError::ResumeDead.into()),
            Status::Suspended(_) => {}
        }
        // The target must not already be in the caller's resume chain
        let mut link = Some(caller.clone());
        while let Some(co) = link {
            if co == *self {
                return Err(CoroutineError::ResumeNonSuspended.into());
            }
            link = co.resumer();
        }
        Ok(())
    }

    /// Transfer control to this coroutine with `args` and block until it
    /// yields or terminates.
    pub fn resume(&self, cx: &Context<'_>, args: Values) -> LResult<ResumeResult> {
        let caller = cx.current();
        self.check_resumable(&caller)?;
        // Every running or normal coroutine pins a stack
        if cx.registry().depth() >= cx.config().max_resume_depth {
            debug!(
                "coroutine {}: refused, {} resumes already nested",
                self.0.id,
                cx.registry().depth()
            );
            return Err(CoroutineError::ResumeOverflow.into());
        }

        let parked = self.0.task.borrow_mut().take();
        let mut task = match parked {
            Some(task) => task,
            None => self.spawn_task(cx)?,
        };

        trace!(
            "coroutine {}: resumed by {} with {} value(s)",
            self.0.id,
            caller.id(),
            args.len()
        );
        let run = Run::enter(cx.registry(), caller, self.clone());
        match task.resume(args) {
            Handoff::Yielded(values) => {
                *self.0.task.borrow_mut() = Some(task);
                run.finish(Status::Suspended(Suspension::Parked));
                trace!("coroutine {}: parked", self.0.id);
                Ok(Ok(values))
            }
            Handoff::Finished(Ok(values)) => {
                run.finish(Status::Dead(Termination::Returned));
                trace!("coroutine {}: returned {} value(s)", self.0.id, values.len());
                Ok(Ok(values))
            }
            Handoff::Finished(Err(err)) => {
                run.finish(Status::Dead(Termination::Errored));
                trace!("coroutine {}: died with error: {}", self.0.id, err);
                Ok(Err(err.into_value()))
            }
        }
    }

    fn spawn_task(&self, cx: &Context<'_>) -> LResult<Task> {
        let body = match &self.0.body {
            Some(body) => body.clone(),
            None => return Err(CoroutineError::ResumeNonSuspended.into()),
        };
        let state = cx.state().clone();
        let weak = self.downgrade();
        let size = state.config.coroutine_stack_size;
        debug!("coroutine {}: allocating {} byte stack", self.0.id, size);

        Task::spawn(size, move |yielder, args| {
            let cx = Context::for_task(state, weak, yielder);
            body.call(&cx, args)
        })
        .map_err(|err| {
            warn!("coroutine {}: stack allocation failed: {}", self.0.id, err);
            LError::from(CoroutineError::StackAllocation(err.to_string()))
        })
    }

    /// Kill a suspended coroutine: run its pending cleanup hooks, newest
    /// first, then release its stack without running any more script code.
    pub fn close(&self, cx: &Context<'_>) -> LResult<CloseResult> {
        match self.status_in(cx) {
            Status::Running => return Err(CoroutineError::CloseRunning.into()),
            Status::Normal => return Err(CoroutineError::CloseNormal.into()),
            Status::Dead(_) => return Ok(Ok(())),
            Status::Suspended(_) => {}
        }

        let pending = std::mem::take(&mut *self.0.pending_cleanup.borrow_mut());
        self.set_status(Status::Dead(Termination::Closed));
        trace!(
            "coroutine {}: closing with {} pending cleanup(s)",
            self.0.id,
            pending.len()
        );

        let hook_cx = cx.without_yield();
        let mut first_error: Option<Value> = None;
        for value in pending.into_iter().rev() {
            let err = first_error.clone().unwrap_or_default();
            if let Err(e) = vm::call_close_hook(&hook_cx, &value, err) {
                first_error.get_or_insert_with(|| e.into_value());
            }
        }

        let task = self.0.task.borrow_mut().take();
        drop(task);

        Ok(match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }

    pub(crate) fn cleanup_len(&self) -> usize {
        self.0.pending_cleanup.borrow().len()
    }

    pub(crate) fn push_cleanup(&self, value: Value) {
        self.0.pending_cleanup.borrow_mut().push(value);
    }

    pub(crate) fn pop_cleanup_above(&self, mark: usize) -> Option<Value> {
        let mut pending = self.0.pending_cleanup.borrow_mut();
        if pending.len() > mark {
            pending.pop()
        } else {
            None
        }
    }
}

impl PartialEq for Coroutine {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Coroutine {}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<coroutine {}:{}>", self.0.id, self.status())
    }
}

/// One resume in flight. Entering links the target under its caller;
/// dropping unlinks it on every path, panics included. A run dropped
/// without `finish` leaves the target dead.
struct Run<'r> {
    registry: &'r Registry,
    caller: Coroutine,
    target: Coroutine,
    finished: bool,
}

impl<'r> Run<'r> {
    fn enter(registry: &'r Registry, caller: Coroutine, target: Coroutine) -> Self {
        *target.0.resumer.borrow_mut() = Some(caller.downgrade());
        caller.set_status(Status::Normal);
        target.set_status(Status::Running);
        registry.push_active(target.clone());
        Run {
            registry,
            caller,
            target,
            finished: false,
        }
    }

    fn finish(mut self, status: Status) {
        self.target.set_status(status);
        self.finished = true;
    }
}

impl Drop for Run<'_> {
    fn drop(&mut self) {
        self.registry.pop_active();
        *self.target.0.resumer.borrow_mut() = None;
        if !self.finished {
            self.target
                .0
                .status
                .set(Status::Dead(Termination::Errored));
        }
        self.caller.0.status.set(Status::Running);
    }
}
