use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use folio_protocol::{Scheduler, Slot, Task, TaskId};

/// A scheduler that only runs tasks when told to.
///
/// `run_frame` plays the role of one animation frame, `run_idle` of one
/// idle period. Tasks queued while a batch runs wait for the next batch.
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<BTreeMap<TaskId, (Slot, Task)>>,
    next_id: Cell<u64>,
    cancelled: Cell<usize>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_frames(&self) -> usize {
        self.count(|slot| matches!(slot, Slot::Frame))
    }

    pub fn pending_idle(&self) -> usize {
        self.count(|slot| matches!(slot, Slot::Idle { .. }))
    }

    /// Total number of cancellations seen so far.
    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }

    /// Timeouts of the queued idle tasks, in queue order.
    pub fn idle_timeouts(&self) -> Vec<u32> {
        self.tasks
            .borrow()
            .values()
            .filter_map(|(slot, _)| match slot {
                Slot::Idle { timeout_ms } => Some(*timeout_ms),
                Slot::Frame => None,
            })
            .collect()
    }

    /// Run every frame task queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        self.run_batch(|slot| matches!(slot, Slot::Frame))
    }

    /// Run every idle task queued before this call. Returns how many ran.
    pub fn run_idle(&self) -> usize {
        self.run_batch(|slot| matches!(slot, Slot::Idle { .. }))
    }

    fn count(&self, pick: impl Fn(&Slot) -> bool) -> usize {
        self.tasks
            .borrow()
            .values()
            .filter(|(slot, _)| pick(slot))
            .count()
    }

    fn run_batch(&self, pick: impl Fn(&Slot) -> bool) -> usize {
        let ids: Vec<TaskId> = self
            .tasks
            .borrow()
            .iter()
            .filter(|(_, (slot, _))| pick(slot))
            .map(|(id, _)| *id)
            .collect();
        let mut ran = 0;
        for id in ids {
            // A task earlier in the batch may have cancelled this one.
            let task = self.tasks.borrow_mut().remove(&id);
            if let Some((_, task)) = task {
                task();
                ran += 1;
            }
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, slot: Slot, task: Task) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.tasks.borrow_mut().insert(id, (slot, task));
        id
    }

    fn cancel(&self, id: TaskId) {
        if self.tasks.borrow_mut().remove(&id).is_some() {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}
