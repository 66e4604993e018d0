//! Processes and threads.
//!
//! A process is a fixed slot in the global process table plus a
//! [`Process`] control block; a thread is a host thread plus a [`Thread`]
//! join handle owned by its process. Process 0 is the idle process and
//! process 1 is init; both are parentless, and init adopts the children of
//! every other process that exits.

pub use self::exit::{exit, thread_exit};
pub use self::process::{Process, ProcessFilter, ProcessInner, ProcessStatus};
pub use self::spawn::do_exec;
pub use self::task::Task;
pub use self::thread::{Thread, ThreadId, ThreadInner};
pub use self::threads_ops::{
    do_create_thread, do_thread_detach, do_thread_join, do_thread_self,
};
pub use self::wait::do_wait_child;

pub mod current;
pub(crate) mod table;
pub(crate) mod task;

mod exit;
mod process;
mod spawn;
mod thread;
mod threads_ops;
mod wait;

use crate::prelude::*;

#[allow(non_camel_case_types)]
pub type pid_t = u32;
#[allow(non_camel_case_types)]
pub type tid_t = u32;

pub type ProcessRef = Arc<Process>;
pub type ThreadRef = Arc<Thread>;

/// The pid of the calling process.
pub fn do_getpid() -> pid_t {
    current!().process().pid()
}

/// The pid of the calling process's parent, or 0 when it has none.
///
/// An orphan adopted by init reports 1.
pub fn do_getppid() -> pid_t {
    current!().process().ppid()
}
