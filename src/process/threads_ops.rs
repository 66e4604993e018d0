use crate::prelude::*;

use super::{task, tid_t, Task, Thread, ThreadRef};

/// Creates a new thread in the calling process and returns its tid.
///
/// The argument bytes are moved into the thread; the task runs them through
/// the same trampoline as a process's main task, and its return value
/// becomes the thread's exit value.
pub fn do_create_thread(task_body: Task, args: Vec<u8>) -> Result<tid_t> {
    let current = current!();
    let process = current.process().clone();

    let new_thread = Thread::new(process.clone());
    {
        let mut inner = process.inner();
        inner
            .threads_mut()
            .expect("a running process can gain threads")
            .push(new_thread.clone());
        inner.inc_thread_count();
    }

    if let Err(e) = task::spawn_kernel_thread(
        new_thread.clone(),
        task_body,
        args.into_boxed_slice(),
        false,
    ) {
        let mut inner = process.inner();
        inner
            .threads_mut()
            .expect("a running process can lose threads")
            .retain(|thread| thread.tid() != new_thread.tid());
        inner.dec_thread_count();
        return Err(e);
    }

    debug!("new thread: tid = {}", new_thread.tid());
    Ok(new_thread.tid())
}

/// The tid of the calling thread.
pub fn do_thread_self() -> tid_t {
    current!().tid()
}

/// Waits for a thread of the calling process to exit and returns its exit
/// value.
///
/// Fails with `ESRCH` when the tid does not belong to this process,
/// `EDEADLK` on a self-join, and `EINVAL` when the target is detached
/// (including a detach that lands while the join is already blocked). The
/// last joiner of an exited thread unlinks its handle from the process.
pub fn do_thread_join(tid: tid_t) -> Result<i32> {
    let current = current!();
    let process = current.process();

    let target = find_thread(process, tid)?;
    if target.tid() == current.tid() {
        return_errno!(EDEADLK, "a thread cannot join itself");
    }

    let (exitval, was_last_joiner) = {
        let mut inner = target.inner();
        if inner.is_detached() {
            return_errno!(EINVAL, "cannot join a detached thread");
        }
        inner.add_joiner();
        while !inner.is_exited() && !inner.is_detached() {
            inner = target.exit_cv().wait(inner).unwrap();
        }
        let remaining = inner.remove_joiner();
        if inner.is_detached() {
            return_errno!(EINVAL, "the thread was detached while joining");
        }
        let exitval = inner
            .exitval()
            .expect("a joined thread must have exited");
        (exitval, remaining == 0)
    };

    if was_last_joiner {
        let mut inner = process.inner();
        if let Some(threads) = inner.threads_mut() {
            threads.retain(|thread| thread.tid() != tid);
        }
    }
    Ok(exitval)
}

/// Detaches a thread of the calling process.
///
/// Fails with `ESRCH` when the tid does not belong to this process and
/// `EINVAL` when the target has already exited. Joiners currently blocked
/// on the target are woken and fail. A detached thread's handle is released
/// by the process's last-thread cleanup, never by a joiner.
pub fn do_thread_detach(tid: tid_t) -> Result<()> {
    let current = current!();
    let target = find_thread(current.process(), tid)?;

    {
        let mut inner = target.inner();
        if inner.is_exited() {
            return_errno!(EINVAL, "cannot detach an exited thread");
        }
        inner.set_detached();
    }
    target.exit_cv().notify_all();
    Ok(())
}

fn find_thread(process: &super::ProcessRef, tid: tid_t) -> Result<ThreadRef> {
    process
        .inner()
        .threads()
        .expect("a running process has a thread list")
        .iter()
        .find(|thread| thread.tid() == tid)
        .cloned()
        .ok_or_else(|| errno!(ESRCH, "no such thread in this process"))
}
