use super::{FileDesc, FileRef};
use crate::prelude::*;

/// The per-process descriptor table.
///
/// The table has a fixed length; `put` hands out the lowest free descriptor
/// and fails with `EMFILE` once every slot is taken. Cloning the table (for
/// process spawning) shares the underlying files: each entry's stream lives
/// until the last table referring to it drops the entry.
#[derive(Debug, Clone)]
pub struct FileTable {
    table: Vec<Option<FileTableEntry>>,
    num_fds: usize,
}

#[derive(Debug, Clone)]
struct FileTableEntry {
    file: FileRef,
}

impl FileTable {
    pub fn with_capacity(capacity: usize) -> FileTable {
        FileTable {
            table: vec![None; capacity],
            num_fds: 0,
        }
    }

    pub fn put(&mut self, file: FileRef) -> Result<FileDesc> {
        let free_fd = self
            .table
            .iter()
            .position(|entry| entry.is_none())
            .ok_or_else(|| errno!(EMFILE, "the file table is full"))?;
        self.table[free_fd] = Some(FileTableEntry { file });
        self.num_fds += 1;
        Ok(free_fd as FileDesc)
    }

    pub fn get(&self, fd: FileDesc) -> Result<FileRef> {
        self.table
            .get(fd as usize)
            .and_then(|entry| entry.as_ref())
            .map(|entry| entry.file.clone())
            .ok_or_else(|| errno!(EBADF, "invalid file descriptor"))
    }

    pub fn del(&mut self, fd: FileDesc) -> Result<FileRef> {
        let entry = self
            .table
            .get_mut(fd as usize)
            .ok_or_else(|| errno!(EBADF, "invalid file descriptor"))?;
        match entry.take() {
            Some(entry) => {
                self.num_fds -= 1;
                Ok(entry.file)
            }
            None => return_errno!(EBADF, "invalid file descriptor"),
        }
    }

    /// Drops every entry. Used by process teardown.
    pub fn clear(&mut self) {
        for entry in self.table.iter_mut() {
            *entry = None;
        }
        self.num_fds = 0;
    }

    pub fn len(&self) -> usize {
        self.num_fds
    }
}
