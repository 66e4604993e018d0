//! The process/thread/IPC core of a small teaching operating system.
//!
//! The kernel runs in user space: every kernel thread is backed by a host
//! thread, and all blocking is expressed through per-control-block mutexes
//! and condition variables. A `boot` call brings the kernel up, runs an init
//! task as pid 1 and returns init's exit status once every kernel thread is
//! gone.
//!
//! The public surface mirrors the syscall table of the system:
//! `do_exec`/`do_wait_child`/`exit` for processes, `do_create_thread`/
//! `do_thread_join`/`do_thread_detach`/`thread_exit` for threads, `do_pipe`
//! plus `do_read`/`do_write`/`do_close` for byte streams, and `do_socket`/
//! `do_listen`/`do_accept`/`do_connect`/`do_shutdown` for local stream
//! sockets. All of these must be called from inside a kernel thread (a task
//! started through `boot`, `do_exec` or `do_create_thread`).

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate serde;
extern crate serde_json;

#[macro_use]
mod prelude;
#[macro_use]
mod error;

pub mod boot;
pub mod config;
pub mod fs;
pub mod net;
pub mod process;
pub mod util;

pub use self::boot::boot;
pub use self::config::KernelConfig;
pub use self::error::{Errno, Error, Result};
pub use self::fs::{
    do_close, do_open_info, do_pipe, do_read, do_write, FileDesc, ProcInfo,
};
pub use self::net::{
    do_accept, do_connect, do_listen, do_shutdown, do_socket, port_t, ShutdownMode, NOPORT,
};
pub use self::process::{
    do_create_thread, do_exec, do_getpid, do_getppid, do_thread_detach, do_thread_join,
    do_thread_self, do_wait_child, exit, pid_t, thread_exit, tid_t, ProcessFilter, Task,
};
