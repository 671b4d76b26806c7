//! Per-session coroutine bookkeeping: the main thread, id allocation,
//! the active resume chain and a weak index of every coroutine created.

use super::{Body, Coroutine, CoroutineId, WeakCoroutine};
use log::debug;
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};

/// Dead weak entries are swept every this many registrations.
const PRUNE_INTERVAL: u64 = 64;

pub struct Registry {
    main: Coroutine,
    next_id: Cell<CoroutineId>,
    live: RefCell<FxHashMap<CoroutineId, WeakCoroutine>>,
    /// Coroutines currently inside `resume`, innermost last.
    active: RefCell<Vec<Coroutine>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            main: Coroutine::main(0),
            next_id: Cell::new(1),
            live: RefCell::new(FxHashMap::default()),
            active: RefCell::new(Vec::new()),
        }
    }

    pub fn main(&self) -> &Coroutine {
        &self.main
    }

    /// Create a coroutine in `Suspended(NotStarted)`.
    pub fn spawn(&self, body: Body) -> Coroutine {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let co = Coroutine::new(id, body);
        debug!("coroutine {}: created ({})", id, co.kind_name());

        let mut live = self.live.borrow_mut();
        if id % PRUNE_INTERVAL == 0 {
            live.retain(|_, weak| weak.is_alive());
        }
        live.insert(id, co.downgrade());
        co
    }

    /// The running coroutine: top of the active chain, else main.
    pub fn current(&self) -> Coroutine {
        self.active
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| self.main.clone())
    }

    pub(crate) fn push_active(&self, co: Coroutine) {
        self.active.borrow_mut().push(co);
    }

    pub(crate) fn pop_active(&self) -> Option<Coroutine> {
        self.active.borrow_mut().pop()
    }

    /// Depth of the active resume chain.
    pub fn depth(&self) -> usize {
        self.active.borrow().len()
    }

    /// True when no coroutine is running, i.e. control is on the main
    /// thread at top level.
    pub fn is_idle(&self) -> bool {
        self.active.borrow().is_empty()
    }

    /// Every coroutine still referenced somewhere, by ascending id.
    pub fn live(&self) -> Vec<Coroutine> {
        let mut out: Vec<Coroutine> = self
            .live
            .borrow()
            .values()
            .filter_map(WeakCoroutine::upgrade)
            .collect();
        out.sort_by_key(Coroutine::id);
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
