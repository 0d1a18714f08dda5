use std::cell::Cell;
use std::rc::Rc;

/// Handle to the host-driven repaint loop.
///
/// The loop has no timer of its own: every repaint callback checks the handle
/// and only then advances and asks for the next repaint. [`stop`] is the only
/// way to end it and takes effect before the next callback, so a late
/// repaint after teardown is a no-op.
///
/// Clones share state; everything runs on the host's UI thread.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    running: Rc<Cell<bool>>,
}

/// Start a new loop. The returned handle is running.
pub fn start() -> AnimationHandle {
    AnimationHandle {
        running: Rc::new(Cell::new(true)),
    }
}

/// Stop the loop. Idempotent.
pub fn stop(handle: &AnimationHandle) {
    handle.running.set(false);
}

impl AnimationHandle {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Whether two handles refer to the same loop.
    pub fn same_loop(&self, other: &AnimationHandle) -> bool {
        Rc::ptr_eq(&self.running, &other.running)
    }
}
