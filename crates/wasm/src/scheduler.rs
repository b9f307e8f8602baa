use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use folio_protocol::{Scheduler, Slot, Task, TaskId};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{IdleRequestOptions, Window};

enum Handle {
    Frame(i32),
    Idle(u32),
    Timeout(i32),
}

struct Pending {
    handle: Handle,
    _closure: Closure<dyn FnMut()>,
}

type Table = Rc<RefCell<HashMap<TaskId, Pending>>>;

/// Animation frames and idle callbacks on the browser event loop.
///
/// Idle slots use `requestIdleCallback` with the slot's timeout; browsers
/// without it get a plain `setTimeout` of the same length.
pub struct BrowserScheduler {
    window: Window,
    pending: Table,
    next_id: Cell<u64>,
    has_idle_callback: bool,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        let has_idle_callback =
            js_sys::Reflect::has(&window, &JsValue::from_str("requestIdleCallback"))
                .unwrap_or(false);
        Self {
            window,
            pending: Rc::new(RefCell::new(HashMap::new())),
            next_id: Cell::new(0),
            has_idle_callback,
        }
    }

    fn request(&self, slot: Slot, callback: &js_sys::Function) -> Result<Handle, JsValue> {
        match slot {
            Slot::Frame => self.window.request_animation_frame(callback).map(Handle::Frame),
            Slot::Idle { timeout_ms } if self.has_idle_callback => {
                let options = IdleRequestOptions::new();
                options.set_timeout(timeout_ms);
                self.window
                    .request_idle_callback_with_options(callback, &options)
                    .map(Handle::Idle)
            }
            Slot::Idle { timeout_ms } => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    callback,
                    i32::try_from(timeout_ms).unwrap_or(i32::MAX),
                )
                .map(Handle::Timeout),
        }
    }

    fn release(&self, handle: &Handle) {
        match *handle {
            Handle::Frame(h) => {
                self.window.cancel_animation_frame(h).ok();
            }
            Handle::Idle(h) => self.window.cancel_idle_callback(h),
            Handle::Timeout(h) => self.window.clear_timeout_with_handle(h),
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn schedule(&self, slot: Slot, task: Task) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let table = Rc::clone(&self.pending);
        let mut task = Some(task);
        let closure = Closure::<dyn FnMut()>::new(move || {
            // Held until the task returns; the closure is freed after this call.
            let _spent = table.borrow_mut().remove(&id);
            if let Some(task) = task.take() {
                task();
            }
        });
        match self.request(slot, closure.as_ref().unchecked_ref()) {
            Ok(handle) => {
                self.pending.borrow_mut().insert(
                    id,
                    Pending {
                        handle,
                        _closure: closure,
                    },
                );
            }
            Err(err) => tracing::warn!(?err, ?slot, "could not schedule task"),
        }
        id
    }

    fn cancel(&self, id: TaskId) {
        let pending = self.pending.borrow_mut().remove(&id);
        if let Some(pending) = pending {
            self.release(&pending.handle);
        }
    }
}

impl Drop for BrowserScheduler {
    fn drop(&mut self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for (_, pending) in pending {
            self.release(&pending.handle);
        }
    }
}
