use crate::prelude::*;

use super::{pid_t, table, ProcessFilter, ProcessInner, ProcessRef, ProcessStatus};

/// Waits for a child of the calling process to exit and reaps it.
///
/// With `ProcessFilter::WithPid`, the call fails with `ESRCH` when the pid
/// is not a child of the caller, and otherwise blocks until that child is a
/// zombie. With `ProcessFilter::WithAnyPid`, the call fails with `ECHILD`
/// when there are no children at all, and otherwise reaps the oldest
/// zombie, blocking until one appears. Returns the reaped pid and its exit
/// status.
pub fn do_wait_child(filter: ProcessFilter) -> Result<(pid_t, i32)> {
    let thread = current!();
    let process = thread.process();

    let mut inner = process.inner();
    loop {
        match filter {
            ProcessFilter::WithPid(pid) => {
                let child = inner
                    .children()
                    .expect("a running process has a child list")
                    .iter()
                    .find(|child| child.pid() == pid)
                    .cloned();
                let child = match child {
                    Some(child) => child,
                    None => return_errno!(ESRCH, "not a child of this process"),
                };
                if child.status() == ProcessStatus::Zombie {
                    let exit_status = reap(&mut inner, &child);
                    drop(inner);
                    table::release(&child);
                    return Ok((pid, exit_status));
                }
            }
            ProcessFilter::WithAnyPid => {
                if inner
                    .children()
                    .expect("a running process has a child list")
                    .is_empty()
                {
                    return_errno!(ECHILD, "no children to wait for");
                }
                let oldest = inner
                    .zombies()
                    .expect("a running process has a zombie list")
                    .front()
                    .cloned();
                if let Some(zombie) = oldest {
                    let pid = zombie.pid();
                    let exit_status = reap(&mut inner, &zombie);
                    drop(inner);
                    table::release(&zombie);
                    return Ok((pid, exit_status));
                }
            }
        }
        inner = process.child_exit().wait(inner).unwrap();
    }
}

/// Unlinks a zombie child from both parent lists and returns its status.
/// The caller still holds the parent lock; the pid slot is released after.
fn reap(parent_inner: &mut MutexGuard<'_, ProcessInner>, zombie: &ProcessRef) -> i32 {
    let exit_status = zombie
        .inner()
        .exit_status()
        .expect("a reaped child must be a zombie");
    let pid = zombie.pid();
    parent_inner
        .children_mut()
        .expect("a running process has a child list")
        .retain(|child| child.pid() != pid);
    parent_inner
        .zombies_mut()
        .expect("a running process has a zombie list")
        .retain(|child| child.pid() != pid);
    exit_status
}
