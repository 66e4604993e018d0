use std::any::Any;

use crate::prelude::*;

pub type FileDesc = u32;

/// The operations a descriptor can dispatch to.
///
/// Streams implement the subset that makes sense for them: a pipe reader
/// only reads, a pipe writer only writes, a socket does both once connected.
/// Everything else fails with `EBADF`. Closing is expressed by dropping the
/// last reference to the file.
pub trait File: Debug + Sync + Send + Any {
    fn read(&self, _buf: &mut [u8]) -> Result<usize> {
        return_errno!(EBADF, "the file cannot read");
    }

    fn write(&self, _buf: &[u8]) -> Result<usize> {
        return_errno!(EBADF, "the file cannot write");
    }

    fn as_any(&self) -> &dyn Any;
}

pub type FileRef = Arc<dyn File>;
