use std::cell::RefCell;
use std::rc::Rc;

use crate::renderer::device::{DrawRecorder, SharedRecorder};

/// The "active recorder" slot of one pipeline kind.
///
/// `begin`/`end` must be strictly paired. Drawing with no open session and
/// opening a second session over an active one are programming errors and
/// panic.
pub struct DrawSession {
    kind: &'static str,
    recorder: RefCell<Option<SharedRecorder>>,
}

impl DrawSession {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            recorder: RefCell::new(None),
        }
    }

    pub fn begin(&self, recorder: SharedRecorder) {
        let mut active = self.recorder.borrow_mut();
        assert!(
            active.is_none(),
            "{}::pre_draw called while a draw session is already active",
            self.kind
        );
        *active = Some(recorder);
    }

    pub fn end(&self) {
        self.recorder.borrow_mut().take();
    }

    pub fn is_active(&self) -> bool {
        self.recorder.borrow().is_some()
    }

    /// Runs `f` against the active recorder.
    pub fn with_recorder<R>(&self, f: impl FnOnce(&mut dyn DrawRecorder) -> R) -> R {
        let recorder = match self.recorder.borrow().as_ref() {
            Some(recorder) => Rc::clone(recorder),
            None => panic!("{}::draw called outside of a draw session", self.kind),
        };
        let mut recorder = recorder.borrow_mut();
        f(&mut *recorder)
    }
}
