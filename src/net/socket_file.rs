use std::any::Any;

use crate::prelude::*;

use super::socket::Socket;

/// Binds a socket into the descriptor table.
///
/// Descriptor tables of related processes share the same `SocketFile`, so
/// the socket closes exactly when the last descriptor referring to it is
/// gone.
#[derive(Debug)]
pub struct SocketFile {
    socket: Arc<Socket>,
}

impl SocketFile {
    pub(super) fn new(socket: Arc<Socket>) -> SocketFile {
        SocketFile { socket }
    }

    pub fn socket(&self) -> &Arc<Socket> {
        &self.socket
    }
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        self.socket.close();
    }
}

impl File for SocketFile {
    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.socket.read(buf)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.socket.write(buf)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
