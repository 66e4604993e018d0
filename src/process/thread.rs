use std::sync::atomic::{AtomicU32, Ordering};

use crate::prelude::*;

use super::{tid_t, ProcessRef, ThreadRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadId(u32);

impl ThreadId {
    pub fn new() -> ThreadId {
        static NEXT_TID: AtomicU32 = AtomicU32::new(1);
        ThreadId(NEXT_TID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

/// The join handle of a thread, owned by its process.
///
/// The handle outlives the host thread: it stays on the process's thread
/// list until the last joiner of an exited thread unlinks it, or until the
/// process's last-thread cleanup drains the list. `joiners` counts the
/// in-flight joins; `exit_cv` is broadcast on exit and on detach.
pub struct Thread {
    // Immutable info
    tid: ThreadId,
    // Mutable info
    inner: Mutex<ThreadInner>,
    exit_cv: Condvar,
    // Process
    process: ProcessRef,
}

impl Thread {
    pub(super) fn new(process: ProcessRef) -> ThreadRef {
        Arc::new(Thread {
            tid: ThreadId::new(),
            inner: Mutex::new(ThreadInner::new()),
            exit_cv: Condvar::new(),
            process,
        })
    }

    pub fn tid(&self) -> tid_t {
        self.tid.as_u32()
    }

    pub fn process(&self) -> &ProcessRef {
        &self.process
    }

    pub(crate) fn inner(&self) -> MutexGuard<'_, ThreadInner> {
        self.inner.lock().unwrap()
    }

    pub(crate) fn exit_cv(&self) -> &Condvar {
        &self.exit_cv
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        self.tid() == other.tid()
    }
}

// Manual Debug: a Thread points at its Process, which owns the thread list.
impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("tid", &self.tid())
            .field("pid", &self.process().pid())
            .finish()
    }
}

#[derive(Debug)]
pub struct ThreadInner {
    exited: Option<i32>,
    detached: bool,
    joiners: usize,
}

impl ThreadInner {
    fn new() -> ThreadInner {
        ThreadInner {
            exited: None,
            detached: false,
            joiners: 0,
        }
    }

    pub fn is_exited(&self) -> bool {
        self.exited.is_some()
    }

    pub fn exitval(&self) -> Option<i32> {
        self.exited
    }

    pub(crate) fn set_exited(&mut self, exitval: i32) {
        debug_assert!(self.exited.is_none());
        self.exited = Some(exitval);
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub(crate) fn set_detached(&mut self) {
        self.detached = true;
    }

    pub(crate) fn add_joiner(&mut self) {
        self.joiners += 1;
    }

    /// Drops one joiner reference and returns how many remain.
    pub(crate) fn remove_joiner(&mut self) -> usize {
        debug_assert!(self.joiners > 0);
        self.joiners -= 1;
        self.joiners
    }
}
