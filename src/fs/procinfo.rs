//! The read-only process listing.
//!
//! `do_open_info` binds a cursor over the process table to a descriptor.
//! Every `read` emits exactly one JSON-serialized [`ProcInfo`] record and
//! advances the cursor; a read past the last occupied slot returns 0.

use std::any::Any;

use serde::Serialize;

use crate::prelude::*;
use crate::process::table;
use crate::process::ProcessStatus;

/// One record of the process listing.
#[derive(Debug, Serialize)]
pub struct ProcInfo {
    pub pid: pid_t,
    pub ppid: pid_t,
    pub alive: bool,
    pub thread_count: usize,
    /// The main task's argument bytes, truncated to the configured limit.
    /// Empty for zombies, whose arguments have already been released.
    pub args: Vec<u8>,
}

#[derive(Debug)]
pub struct ProcInfoFile {
    cursor: Mutex<pid_t>,
}

impl ProcInfoFile {
    fn new() -> ProcInfoFile {
        ProcInfoFile {
            cursor: Mutex::new(0),
        }
    }
}

impl File for ProcInfoFile {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut cursor = self.cursor.lock().unwrap();
        let (pid, process) = match table::next_process(*cursor) {
            Some(next) => next,
            None => return Ok(0),
        };

        let info = {
            let max_args = crate::config::get().procinfo_max_args_size;
            let inner = process.inner();
            let args = match inner.args() {
                Some(args) => args[..args.len().min(max_args)].to_vec(),
                None => Vec::new(),
            };
            ProcInfo {
                pid,
                ppid: process.ppid(),
                alive: inner.status() == ProcessStatus::Running,
                thread_count: inner.thread_count(),
                args,
            }
        };

        let record = serde_json::to_vec(&info)
            .map_err(|_| errno!(EIO, "cannot serialize a procinfo record"))?;
        if buf.len() < record.len() {
            return_errno!(EINVAL, "the buffer is too small for a procinfo record");
        }
        buf[..record.len()].copy_from_slice(&record);
        *cursor = pid + 1;
        Ok(record.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Reserves a descriptor bound to a fresh process-listing cursor.
pub fn do_open_info() -> Result<FileDesc> {
    let fd = current!()
        .process()
        .files()
        .lock()
        .unwrap()
        .put(Arc::new(ProcInfoFile::new()))?;
    debug!("openinfo: fd = {}", fd);
    Ok(fd)
}
