use crate::fs::FileTable;
use crate::prelude::*;

use super::{pid_t, ProcessRef, ThreadRef};

pub struct Process {
    // Immutable info
    pid: pid_t,
    // Mutable info
    parent: RwLock<Option<ProcessRef>>,
    files: Mutex<FileTable>,
    inner: Mutex<ProcessInner>,
    // Broadcast each time one of this process's children becomes a zombie
    child_exit: Condvar,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ProcessStatus {
    Running,
    Zombie,
}

/// Selects which child a `do_wait_child` call waits for.
#[derive(Debug, Clone, Copy)]
pub enum ProcessFilter {
    WithAnyPid,
    WithPid(pid_t),
}

impl Process {
    pub(crate) fn new(
        pid: pid_t,
        parent: Option<ProcessRef>,
        args: Box<[u8]>,
        files: FileTable,
    ) -> ProcessRef {
        Arc::new(Process {
            pid,
            parent: RwLock::new(parent),
            files: Mutex::new(files),
            inner: Mutex::new(ProcessInner::new(args)),
            child_exit: Condvar::new(),
        })
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    /// The parent process. Only pid 0 and pid 1 have none.
    pub fn parent(&self) -> Option<ProcessRef> {
        self.parent.read().unwrap().clone()
    }

    pub fn ppid(&self) -> pid_t {
        self.parent().map(|parent| parent.pid()).unwrap_or(0)
    }

    pub(crate) fn set_parent(&self, new_parent: ProcessRef) {
        *self.parent.write().unwrap() = Some(new_parent);
    }

    /// Whether `candidate` is still this process's parent. Used after
    /// taking the candidate's lock: a parent that exited in the meantime
    /// has moved this process to init.
    pub(crate) fn parent_is(&self, candidate: &ProcessRef) -> bool {
        match &*self.parent.read().unwrap() {
            Some(parent) => Arc::ptr_eq(parent, candidate),
            None => false,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.inner().status()
    }

    pub(crate) fn files(&self) -> &Mutex<FileTable> {
        &self.files
    }

    pub(crate) fn inner(&self) -> MutexGuard<'_, ProcessInner> {
        self.inner.lock().unwrap()
    }

    pub(crate) fn child_exit(&self) -> &Condvar {
        &self.child_exit
    }
}

impl PartialEq for Process {
    fn eq(&self, other: &Self) -> bool {
        self.pid() == other.pid()
    }
}

// An explicit implementation of Debug is required since Process values
// refer to each other through the parent/children links; deriving would
// recurse forever.
impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process").field("pid", &self.pid()).finish()
    }
}

pub enum ProcessInner {
    Live {
        /// Recorded by `exit`; reported to the parent once the last thread
        /// is gone.
        exit_code: i32,
        /// The main task's argument bytes, owned by the process.
        args: Box<[u8]>,
        /// Every unreaped thread handle of the process, main thread first.
        threads: Vec<ThreadRef>,
        /// How many of those threads have not yet exited.
        thread_count: usize,
        /// Every unreaped child, living and zombie alike.
        children: Vec<ProcessRef>,
        /// The zombie children, oldest first.
        zombies: VecDeque<ProcessRef>,
    },
    Zombie {
        exit_status: i32,
    },
}

impl ProcessInner {
    pub fn new(args: Box<[u8]>) -> ProcessInner {
        ProcessInner::Live {
            exit_code: 0,
            args,
            threads: Vec::new(),
            thread_count: 0,
            children: Vec::new(),
            zombies: VecDeque::new(),
        }
    }

    pub fn status(&self) -> ProcessStatus {
        match self {
            ProcessInner::Live { .. } => ProcessStatus::Running,
            ProcessInner::Zombie { .. } => ProcessStatus::Zombie,
        }
    }

    pub fn thread_count(&self) -> usize {
        match self {
            ProcessInner::Live { thread_count, .. } => *thread_count,
            ProcessInner::Zombie { .. } => 0,
        }
    }

    pub fn args(&self) -> Option<&[u8]> {
        match self {
            ProcessInner::Live { args, .. } => Some(args),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn threads(&self) -> Option<&Vec<ThreadRef>> {
        match self {
            ProcessInner::Live { threads, .. } => Some(threads),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn threads_mut(&mut self) -> Option<&mut Vec<ThreadRef>> {
        match self {
            ProcessInner::Live { threads, .. } => Some(threads),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<ProcessRef>> {
        match self {
            ProcessInner::Live { children, .. } => Some(children),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<ProcessRef>> {
        match self {
            ProcessInner::Live { children, .. } => Some(children),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn zombies(&self) -> Option<&VecDeque<ProcessRef>> {
        match self {
            ProcessInner::Live { zombies, .. } => Some(zombies),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub fn zombies_mut(&mut self) -> Option<&mut VecDeque<ProcessRef>> {
        match self {
            ProcessInner::Live { zombies, .. } => Some(zombies),
            ProcessInner::Zombie { .. } => None,
        }
    }

    pub(crate) fn set_exit_code(&mut self, code: i32) {
        match self {
            ProcessInner::Live { exit_code, .. } => *exit_code = code,
            ProcessInner::Zombie { .. } => unreachable!("a zombie cannot exit again"),
        }
    }

    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            ProcessInner::Live { exit_code, .. } => *exit_code,
            ProcessInner::Zombie { exit_status } => *exit_status,
        }
    }

    pub fn exit_status(&self) -> Option<i32> {
        match self {
            ProcessInner::Zombie { exit_status } => Some(*exit_status),
            ProcessInner::Live { .. } => None,
        }
    }

    pub(crate) fn inc_thread_count(&mut self) {
        match self {
            ProcessInner::Live { thread_count, .. } => *thread_count += 1,
            ProcessInner::Zombie { .. } => unreachable!("a zombie cannot gain threads"),
        }
    }

    /// Decrements the live-thread count and returns the new value.
    pub(crate) fn dec_thread_count(&mut self) -> usize {
        match self {
            ProcessInner::Live { thread_count, .. } => {
                debug_assert!(*thread_count > 0);
                *thread_count -= 1;
                *thread_count
            }
            ProcessInner::Zombie { .. } => unreachable!("a zombie has no running threads"),
        }
    }

    /// Empties both child lists for reparenting, leaving the process live.
    pub(crate) fn take_children_and_zombies(&mut self) -> (Vec<ProcessRef>, VecDeque<ProcessRef>) {
        match self {
            ProcessInner::Live {
                children, zombies, ..
            } => (std::mem::take(children), std::mem::take(zombies)),
            ProcessInner::Zombie { .. } => unreachable!("a zombie has no children left"),
        }
    }

    /// Flips the process to a zombie. Every thread must be gone and the
    /// child lists must have been dispersed already; the thread handles are
    /// released here.
    pub(crate) fn exit(&mut self, exit_status: i32) {
        debug_assert!(self.thread_count() == 0);
        debug_assert!(self
            .children()
            .map_or(true, |children| children.is_empty()));
        *self = ProcessInner::Zombie { exit_status };
    }
}

impl fmt::Debug for ProcessInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessInner::Live {
                thread_count,
                children,
                ..
            } => f
                .debug_struct("ProcessInner::Live")
                .field("thread_count", thread_count)
                .field(
                    "child_pids",
                    &children.iter().map(|child| child.pid()).collect::<Vec<pid_t>>(),
                )
                .finish(),
            ProcessInner::Zombie { exit_status } => f
                .debug_struct("ProcessInner::Zombie")
                .field("exit_status", exit_status)
                .finish(),
        }
    }
}
