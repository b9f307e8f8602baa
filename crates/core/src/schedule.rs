//! Coalescing of recurring recomputations and listener bookkeeping.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use folio_protocol::{Host, ListenerId, Scheduler, Slot, TaskId};

/// At most one pending pass per owner.
///
/// `request` cancels whatever pass is still queued and schedules the new
/// one, so the most recent request wins and work is bounded to one pass
/// per slot tick. Dropping the `FramePass` cancels the pending pass.
///
/// The scheduler must not run a task from inside `schedule`.
pub struct FramePass {
    scheduler: Rc<dyn Scheduler>,
    slot: Slot,
    pending: Rc<Cell<Option<TaskId>>>,
}

impl FramePass {
    pub fn new(scheduler: Rc<dyn Scheduler>, slot: Slot) -> Self {
        Self {
            scheduler,
            slot,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// One pass per animation frame.
    pub fn frame(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::new(scheduler, Slot::Frame)
    }

    /// One pass per idle period, forced after `timeout_ms`.
    pub fn idle(scheduler: Rc<dyn Scheduler>, timeout_ms: u32) -> Self {
        Self::new(scheduler, Slot::Idle { timeout_ms })
    }

    pub fn request(&self, pass: impl FnOnce() + 'static) {
        self.request_in(self.slot, pass);
    }

    /// Like [`request`](Self::request) but on an explicit slot, e.g. a
    /// shorter idle deadline for the first run.
    pub fn request_in(&self, slot: Slot, pass: impl FnOnce() + 'static) {
        self.cancel();
        let pending = Rc::clone(&self.pending);
        let id = self.scheduler.schedule(
            slot,
            Box::new(move || {
                pending.set(None);
                pass();
            }),
        );
        self.pending.set(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for FramePass {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Listener ids owned by one component, removed together at teardown.
#[derive(Debug, Default)]
pub struct Subscriptions {
    ids: RefCell<Vec<ListenerId>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, id: ListenerId) {
        self.ids.borrow_mut().push(id);
    }

    pub fn len(&self) -> usize {
        self.ids.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }

    /// Unregister every listener. Calling it again is a no-op.
    pub fn remove_all(&self, host: &dyn Host) {
        let ids = std::mem::take(&mut *self.ids.borrow_mut());
        for id in ids {
            host.unlisten(id);
        }
    }
}
