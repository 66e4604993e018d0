pub use self::file::{File, FileDesc, FileRef};
pub use self::file_table::FileTable;
pub use self::pipe::{do_pipe, pipe, PipeReader, PipeWriter};
pub use self::procinfo::{do_open_info, ProcInfo, ProcInfoFile};

mod file;
mod file_table;
mod pipe;
mod procinfo;

use crate::prelude::*;

/// Read from a descriptor of the calling process.
pub fn do_read(fd: FileDesc, buf: &mut [u8]) -> Result<usize> {
    let file = current!().process().files().lock().unwrap().get(fd)?;
    file.read(buf)
}

/// Write to a descriptor of the calling process.
pub fn do_write(fd: FileDesc, buf: &[u8]) -> Result<usize> {
    let file = current!().process().files().lock().unwrap().get(fd)?;
    file.write(buf)
}

/// Close a descriptor of the calling process.
///
/// The underlying stream is torn down once the last descriptor referring to
/// it (here or in a process that inherited it) is gone.
pub fn do_close(fd: FileDesc) -> Result<()> {
    let file = current!().process().files().lock().unwrap().del(fd)?;
    drop(file);
    Ok(())
}
