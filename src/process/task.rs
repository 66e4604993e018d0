//! Task trampolines and host-thread plumbing.
//!
//! Every kernel thread starts in [`run_task`]: it runs the user task under
//! `catch_unwind`, then feeds the outcome into the exit path. `exit` and
//! `thread_exit` reach the trampoline by unwinding with a typed payload, so
//! they can carry a `!` return type without leaking a parked host thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::thread::JoinHandle;

use crate::prelude::*;

use super::{current, exit, ThreadRef};

/// A task body: receives the argument bytes, returns the exit value.
pub type Task = Box<dyn FnOnce(&[u8]) -> i32 + Send + 'static>;

/// The exit status reported for a task that panicked.
const EXITVAL_PANIC: i32 = 101;

pub(crate) enum TermRequest {
    Exit(i32),
    ThreadExit(i32),
}

/// Spawns the host thread backing a kernel thread. The caller has already
/// linked `thread` into its process.
pub(crate) fn spawn_kernel_thread(
    thread: ThreadRef,
    task: Task,
    args: Box<[u8]>,
    is_main: bool,
) -> Result<()> {
    let name = format!("ktask-{}", thread.tid());
    let handle = std::thread::Builder::new()
        .name(name)
        .spawn(move || {
            current::set(thread);
            run_task(task, &args, is_main);
        })
        .map_err(|_| errno!(EAGAIN, "cannot spawn a host thread"))?;
    register_handle(handle);
    Ok(())
}

fn run_task(task: Task, args: &[u8], is_main: bool) {
    match panic::catch_unwind(AssertUnwindSafe(move || task(args))) {
        Ok(exitval) => {
            if is_main {
                exit::do_exit(exitval)
            } else {
                exit::do_thread_exit(exitval)
            }
        }
        Err(payload) => match payload.downcast::<TermRequest>() {
            Ok(request) => match *request {
                TermRequest::Exit(exitval) => exit::do_exit(exitval),
                TermRequest::ThreadExit(exitval) => exit::do_thread_exit(exitval),
            },
            Err(_) => {
                warn!("a task panicked; treating it as process exit");
                exit::do_exit(EXITVAL_PANIC)
            }
        },
    }
}

/// Keeps the default panic hook quiet about the unwinds that implement
/// `exit`/`thread_exit`.
pub(crate) fn init_panic_hook() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let default_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !info.payload().is::<TermRequest>() {
                default_hook(info);
            }
        }));
    });
}

lazy_static! {
    static ref HANDLES: Mutex<Vec<JoinHandle<()>>> = Mutex::new(Vec::new());
}

fn register_handle(handle: JoinHandle<()>) {
    HANDLES.lock().unwrap().push(handle);
}

/// Joins every host thread spawned since the last boot. Threads registered
/// while the loop runs are picked up too.
pub(crate) fn join_all() {
    loop {
        let handle = HANDLES.lock().unwrap().pop();
        match handle {
            Some(handle) => {
                let _ = handle.join();
            }
            None => break,
        }
    }
}
