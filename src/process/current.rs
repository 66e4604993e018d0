//! Get the thread associated with the current host thread.

use std::cell::RefCell;

use super::ThreadRef;

thread_local! {
    static CURRENT: RefCell<Option<ThreadRef>> = RefCell::new(None);
}

/// The kernel thread running on this host thread.
///
/// Panics when the host thread is not a kernel thread; every syscall entry
/// point assumes it runs inside a task started through the kernel.
pub fn get() -> ThreadRef {
    try_get().expect("the current host thread is not a kernel thread")
}

pub fn try_get() -> Option<ThreadRef> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Called once at the very beginning of a task's host thread.
pub(crate) fn set(thread: ThreadRef) {
    CURRENT.with(|current| *current.borrow_mut() = Some(thread));
}

pub(crate) fn clear() {
    CURRENT.with(|current| *current.borrow_mut() = None);
}
