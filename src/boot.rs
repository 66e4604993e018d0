//! Kernel bring-up and tear-down.
//!
//! `boot` initializes the global tables from a [`KernelConfig`], creates
//! the idle process (pid 0) and the init process (pid 1), runs the init
//! task and returns init's exit status once every kernel thread is gone.
//! Because the process table and the port map are process-wide, whole
//! kernel runs are serialized by a boot lock; concurrent `boot` calls take
//! turns.

use crate::config::{self, KernelConfig};
use crate::fs::FileTable;
use crate::net;
use crate::prelude::*;
use crate::process::{self, table, task, Process, Task};

lazy_static! {
    static ref BOOT_LOCK: Mutex<()> = Mutex::new(());
}

pub fn boot(config_in: KernelConfig, init_task: Task, args: &[u8]) -> Result<i32> {
    let _boot_guard = BOOT_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    config_in.validate()?;
    config::set(&config_in);
    task::init_panic_hook();
    table::init(config_in.max_proc);
    net::init_port_map(config_in.max_port);

    // Pid 0, the idle process: parentless, threadless, only there so that
    // the pid numbering starts the way user code expects.
    let idle_pid = table::alloc_pid()?;
    debug_assert_eq!(idle_pid, 0);
    let idle = Process::new(
        idle_pid,
        None,
        Box::default(),
        FileTable::with_capacity(config_in.max_fileid),
    );
    table::install(idle);

    // Pid 1, the init process, runs the boot task.
    let init_pid = process::do_exec(init_task, args)?;
    debug_assert_eq!(init_pid, 1);
    info!("kernel booted: init is pid {}", init_pid);

    // The kernel is down once every kernel thread is gone. Init reaps all
    // other processes before it exits, so this join loop drains quickly
    // after init's own thread finishes.
    task::join_all();

    let init = table::get_process(init_pid)?;
    let exit_status = init
        .inner()
        .exit_status()
        .expect("init must have exited before boot returns");
    table::reset();

    info!("kernel halted: init exited with status {}", exit_status);
    Ok(exit_status)
}
