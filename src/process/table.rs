//! The global process table.
//!
//! A fixed number of pid slots, handed out lowest-first through a free
//! list. Slot 0 belongs to the idle process and slot 1 to init.

use crate::prelude::*;

use super::{pid_t, ProcessRef};

lazy_static! {
    static ref PROCESS_TABLE: Mutex<ProcessTable> = Mutex::new(ProcessTable::new());
}

struct ProcessTable {
    slots: Vec<Option<ProcessRef>>,
    free_pids: Vec<pid_t>,
}

impl ProcessTable {
    fn new() -> ProcessTable {
        ProcessTable {
            slots: Vec::new(),
            free_pids: Vec::new(),
        }
    }
}

/// Sizes the table for a fresh boot. Any leftover state is discarded.
pub(crate) fn init(max_proc: usize) {
    let mut table = PROCESS_TABLE.lock().unwrap();
    table.slots = vec![None; max_proc];
    table.free_pids = (0..max_proc as pid_t).rev().collect();
}

pub(crate) fn alloc_pid() -> Result<pid_t> {
    PROCESS_TABLE
        .lock()
        .unwrap()
        .free_pids
        .pop()
        .ok_or_else(|| errno!(EAGAIN, "the process table is full"))
}

pub(crate) fn install(process: ProcessRef) {
    let mut table = PROCESS_TABLE.lock().unwrap();
    let pid = process.pid() as usize;
    debug_assert!(table.slots[pid].is_none());
    table.slots[pid] = Some(process);
}

/// Returns a reaped process's slot to the free list. The slot is cleared
/// only if it still holds this very process, so a stray second release can
/// never blank a reallocated pid.
pub(crate) fn release(process: &ProcessRef) {
    let mut table = PROCESS_TABLE.lock().unwrap();
    let pid = process.pid();
    if let Some(slot) = table.slots.get_mut(pid as usize) {
        let occupied_by_me = slot
            .as_ref()
            .map_or(false, |resident| Arc::ptr_eq(resident, process));
        debug_assert!(occupied_by_me);
        if occupied_by_me {
            *slot = None;
            table.free_pids.push(pid);
        }
    }
}

pub fn get_process(pid: pid_t) -> Result<ProcessRef> {
    PROCESS_TABLE
        .lock()
        .unwrap()
        .slots
        .get(pid as usize)
        .cloned()
        .flatten()
        .ok_or_else(|| errno!(ESRCH, "no such process"))
}

/// The first occupied slot at or after `from`, in pid order.
pub(crate) fn next_process(from: pid_t) -> Option<(pid_t, ProcessRef)> {
    let table = PROCESS_TABLE.lock().unwrap();
    for pid in (from as usize)..table.slots.len() {
        if let Some(process) = &table.slots[pid] {
            return Some((pid as pid_t, process.clone()));
        }
    }
    None
}

/// Drops every remaining reference at shutdown.
pub(crate) fn reset() {
    let mut table = PROCESS_TABLE.lock().unwrap();
    table.slots.clear();
    table.free_pids.clear();
}
