use std::cell::RefCell;
use std::collections::VecDeque;

use folio_protocol::{CaptureCallback, CaptureError, CaptureRequest, Capturer};

/// Holds capture requests until the test settles them.
#[derive(Default)]
pub struct ScriptedCapturer {
    requests: RefCell<Vec<CaptureRequest>>,
    pending: RefCell<VecDeque<CaptureCallback>>,
}

impl ScriptedCapturer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.requests.borrow().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Settle the oldest in-flight capture. Returns `false` if none.
    pub fn settle(&self, result: Result<String, CaptureError>) -> bool {
        let done = self.pending.borrow_mut().pop_front();
        match done {
            Some(done) => {
                done(result);
                true
            }
            None => false,
        }
    }

    pub fn succeed(&self, data_url: &str) -> bool {
        self.settle(Ok(data_url.to_string()))
    }

    pub fn fail(&self, reason: &str) -> bool {
        self.settle(Err(CaptureError::Rejected(reason.to_string())))
    }
}

impl Capturer for ScriptedCapturer {
    fn capture(&self, request: CaptureRequest, done: CaptureCallback) {
        self.requests.borrow_mut().push(request);
        self.pending.borrow_mut().push_back(done);
    }
}
