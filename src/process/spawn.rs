use crate::fs::FileTable;
use crate::prelude::*;

use super::{pid_t, table, task, Process, ProcessRef, Task, Thread};

/// Creates a new process running `task` and returns its pid.
///
/// The argument bytes are copied into process-owned storage, so the
/// caller's buffer need not outlive the call. A process with pid > 1
/// inherits the caller's descriptor table (entries shared) and becomes its
/// child; pid 0 and pid 1 are parentless and start with an empty table.
pub fn do_exec(task: Task, args: &[u8]) -> Result<pid_t> {
    let pid = table::alloc_pid()?;

    let (parent, files) = if pid <= 1 {
        let files = FileTable::with_capacity(crate::config::get().max_fileid);
        (None, files)
    } else {
        let parent = current!().process().clone();
        let files = parent.files().lock().unwrap().clone();
        (Some(parent), files)
    };

    let new_process = Process::new(pid, parent.clone(), args.to_vec().into_boxed_slice(), files);
    table::install(new_process.clone());
    if let Some(parent) = &parent {
        parent
            .inner()
            .children_mut()
            .expect("a running process can gain children")
            .push(new_process.clone());
    }

    if let Err(e) = spawn_main_thread(&new_process, task) {
        if let Some(parent) = &parent {
            parent
                .inner()
                .children_mut()
                .expect("a running process can lose children")
                .retain(|child| child.pid() != pid);
        }
        table::release(&new_process);
        return Err(e);
    }

    info!("new process: pid = {}, ppid = {}", pid, new_process.ppid());
    Ok(pid)
}

fn spawn_main_thread(process: &ProcessRef, task: Task) -> Result<()> {
    let main_thread = Thread::new(process.clone());
    let args: Box<[u8]> = {
        let mut inner = process.inner();
        inner
            .threads_mut()
            .expect("a fresh process is alive")
            .push(main_thread.clone());
        inner.inc_thread_count();
        inner.args().expect("a fresh process owns its args").into()
    };
    task::spawn_kernel_thread(main_thread, task, args, true)
}
