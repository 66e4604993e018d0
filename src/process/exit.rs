use std::panic;

use crate::prelude::*;

use super::task::TermRequest;
use super::{table, wait, ProcessFilter, ProcessRef};

/// Terminates the calling process with the given status. Never returns.
///
/// Must be called from inside a task; the actual teardown runs in the
/// trampoline after unwinding out of the task body.
pub fn exit(status: i32) -> ! {
    panic::panic_any(TermRequest::Exit(status))
}

/// Terminates the calling thread with the given value. Never returns.
pub fn thread_exit(exitval: i32) -> ! {
    panic::panic_any(TermRequest::ThreadExit(exitval))
}

/// The process-exit path, run by the trampoline.
///
/// Records the exit code and funnels into the thread-exit path; the process
/// itself is torn down by whichever of its threads exits last. Init first
/// reaps every remaining process, its own children and adopted orphans
/// alike.
pub(crate) fn do_exit(status: i32) {
    let thread = current!();
    let process = thread.process().clone();
    process.inner().set_exit_code(status);

    if process.pid() == 1 {
        while wait::do_wait_child(ProcessFilter::WithAnyPid).is_ok() {}
    }

    do_thread_exit(status);
}

/// The thread-exit path, run by the trampoline.
pub(crate) fn do_thread_exit(exitval: i32) {
    let thread = current!();
    let process = thread.process().clone();

    thread.inner().set_exited(exitval);
    thread.exit_cv().notify_all();

    let was_last = process.inner().dec_thread_count() == 0;
    if was_last {
        exit_process(&process);
    }

    super::current::clear();
    trace!("kernel thread {} is gone", thread.tid());
}

/// The last-thread cleanup: disperses the process's children to init,
/// then becomes a zombie in its parent's hands.
///
/// Lock order throughout: init first, then parent, then child. The zombie
/// flip and the push onto the parent's zombie list happen in one critical
/// section under the parent's lock, so a waiting parent can never observe
/// one without the other.
fn exit_process(process: &ProcessRef) {
    let pid = process.pid();
    let exit_status = process.inner().exit_code();

    if pid != 1 {
        let init = table::get_process(1).expect("init outlives every other process");

        // Disperse my children to init before my own death becomes
        // observable. Adoption is atomic with the parent-pointer flip, so
        // a child exiting concurrently delivers itself either to me (and
        // is forwarded below) or, once repointed, straight to init.
        let adopted_zombies = {
            let mut init_inner = init.inner();
            let mut inner = process.inner();
            let (children, zombies) = inner.take_children_and_zombies();
            for child in &children {
                child.set_parent(init.clone());
            }
            init_inner
                .children_mut()
                .expect("init is alive while any other process runs")
                .extend(children.into_iter());
            init_inner
                .zombies_mut()
                .expect("init is alive while any other process runs")
                .extend(zombies.iter().cloned());
            !zombies.is_empty()
        };
        if adopted_zombies {
            init.child_exit().notify_all();
        }
    }

    // Become a zombie in the parent's hands. The parent pointer moves at
    // most once (to init, when the old parent exits first); re-check it
    // after taking the candidate's lock and follow the move. A pointer
    // that still matches under the lock proves the parent has not started
    // its own teardown, hence is alive.
    loop {
        let parent = match process.parent() {
            Some(parent) => parent,
            None => {
                // init and the idle process answer to nobody
                process.inner().exit(exit_status);
                break;
            }
        };
        let mut parent_inner = parent.inner();
        if !process.parent_is(&parent) {
            continue;
        }
        process.inner().exit(exit_status);
        parent_inner
            .zombies_mut()
            .expect("a process whose parent link is intact has a live parent")
            .push_back(process.clone());
        drop(parent_inner);
        parent.child_exit().notify_all();
        break;
    }

    // Release every descriptor; streams close once their last holder is
    // gone.
    process.files().lock().unwrap().clear();

    info!("process {} exited with status {}", pid, exit_status);
}
