use std::time::Duration;

use crate::fs::{pipe, PipeReader, PipeWriter};
use crate::prelude::*;

use super::listener::{ConnRequest, Listener, RequestState};
use super::port_map::PORT_MAP;
use super::socket_file::SocketFile;
use super::{port_t, NOPORT};

bitflags! {
    /// Which direction(s) a `do_shutdown` call tears down.
    pub struct ShutdownMode: u32 {
        const READ = 0b01;
        const WRITE = 0b10;
        const BOTH = Self::READ.bits | Self::WRITE.bits;
    }
}

/// A local stream socket.
///
/// A socket has three states: unbound, listening and connected. It is
/// created unbound, turns into a listener through `do_listen` or into a
/// connected peer through the `do_connect`/`do_accept` rendezvous, and
/// never leaves either terminal state; only closing destroys it.
pub struct Socket {
    inner: Mutex<Status>,
}

enum Status {
    Unbound { port: port_t },
    // The listener itself is stored in the port map, keyed by the port.
    Listening { port: port_t },
    Connected(Endpoint),
}

/// The connected half-pair: this socket reads from one pipe and writes to
/// the other, while the partner socket holds the opposite halves. Each half
/// is cleared by its shutdown path; the pipe buffer goes away when the
/// partner drops the remaining half.
struct Endpoint {
    reader: Option<Arc<PipeReader>>,
    writer: Option<Arc<PipeWriter>>,
}

impl Socket {
    pub(super) fn new(port: port_t) -> Arc<Socket> {
        Arc::new(Socket {
            inner: Mutex::new(Status::Unbound { port }),
        })
    }

    fn inner(&self) -> MutexGuard<'_, Status> {
        self.inner.lock().unwrap()
    }

    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let reader = match &*self.inner() {
            Status::Connected(endpoint) => endpoint
                .reader
                .clone()
                .ok_or_else(|| errno!(EBADF, "the read direction is shut down"))?,
            _ => return_errno!(ENOTCONN, "the socket is not connected"),
        };
        reader.read(buf)
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let writer = match &*self.inner() {
            Status::Connected(endpoint) => endpoint
                .writer
                .clone()
                .ok_or_else(|| errno!(EBADF, "the write direction is shut down"))?,
            _ => return_errno!(ENOTCONN, "the socket is not connected"),
        };
        writer.write(buf)
    }

    fn shutdown(&self, how: ShutdownMode) -> Result<()> {
        if how.is_empty() {
            return_errno!(EINVAL, "invalid shutdown mode");
        }
        match &mut *self.inner() {
            Status::Connected(endpoint) => {
                if how.contains(ShutdownMode::READ) {
                    endpoint.reader.take();
                }
                if how.contains(ShutdownMode::WRITE) {
                    endpoint.writer.take();
                }
                Ok(())
            }
            _ => return_errno!(ENOTCONN, "the socket is not connected"),
        }
    }

    /// The close action, run when the last descriptor referring to the
    /// socket goes away. An operation still blocked on the socket (an
    /// accept, a peer read) holds its own references and finishes on its
    /// own terms; the control block itself is freed once those are gone
    /// too.
    pub(super) fn close(&self) {
        match &mut *self.inner() {
            Status::Listening { port } => {
                if let Some(listener) = PORT_MAP.get_listener_ref(*port) {
                    PORT_MAP.remove_port(*port);
                    // Wake any accept still blocked on the backlog
                    listener.shutdown();
                }
                trace!("listener on port {} closed", port);
            }
            Status::Connected(endpoint) => {
                endpoint.reader.take();
                endpoint.writer.take();
            }
            Status::Unbound { .. } => {}
        }
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.inner() {
            Status::Unbound { port } => write!(f, "Socket::Unbound {{ port: {} }}", port),
            Status::Listening { port } => write!(f, "Socket::Listening {{ port: {} }}", port),
            Status::Connected(endpoint) => f
                .debug_struct("Socket::Connected")
                .field("can_read", &endpoint.reader.is_some())
                .field("can_write", &endpoint.writer.is_some())
                .finish(),
        }
    }
}

/// Creates an unbound socket on `port` and binds it to a fresh descriptor.
///
/// Port 0 is accepted: such a socket can connect but never listen.
pub fn do_socket(port: port_t) -> Result<FileDesc> {
    if port > crate::config::get().max_port {
        return_errno!(EINVAL, "port out of range");
    }
    let socket = Socket::new(port);
    let fd = current!()
        .process()
        .files()
        .lock()
        .unwrap()
        .put(Arc::new(SocketFile::new(socket)))?;
    debug!("socket: port = {}, fd = {}", port, fd);
    Ok(fd)
}

/// Turns an unbound socket into the listener of its port.
pub fn do_listen(fd: FileDesc) -> Result<()> {
    let socket = socket_of(fd)?;
    let mut status = socket.inner();
    let port = match &*status {
        Status::Unbound { port } => *port,
        _ => return_errno!(EINVAL, "the socket is not unbound"),
    };
    if port == NOPORT {
        return_errno!(EINVAL, "the socket has no listenable port");
    }
    PORT_MAP.add_listener(port, Arc::new(Listener::new()))?;
    *status = Status::Listening { port };
    debug!("listen: fd = {}, port = {}", fd, port);
    Ok(())
}

/// Connects an unbound socket to the listener on `port`, giving up after
/// `timeout_ms` milliseconds.
pub fn do_connect(fd: FileDesc, port: port_t, timeout_ms: u64) -> Result<()> {
    let socket = socket_of(fd)?;
    match &*socket.inner() {
        Status::Unbound { .. } => {}
        Status::Connected(_) => return_errno!(EISCONN, "the socket is already connected"),
        Status::Listening { .. } => return_errno!(EINVAL, "a listener cannot connect"),
    }
    let listener = PORT_MAP
        .get_listener_ref(port)
        .ok_or_else(|| errno!(ECONNREFUSED, "no listener on the port"))?;

    let request = ConnRequest::new(socket);
    listener.push_incoming(request.clone())?;
    debug!("connect: fd = {}, port = {}, timeout = {}ms", fd, port, timeout_ms);
    request.wait_admitted(Duration::from_millis(timeout_ms))
}

/// Admits the oldest pending connection on a listening socket.
///
/// Returns the descriptor of a fresh server-side peer socket wired to the
/// connector through two pipes, one per direction.
pub fn do_accept(fd: FileDesc) -> Result<FileDesc> {
    let socket = socket_of(fd)?;
    let port = match &*socket.inner() {
        Status::Listening { port } => *port,
        _ => return_errno!(EINVAL, "the socket is not listening"),
    };
    // Holding the listener keeps it alive for the whole wait, even if the
    // listening descriptor is closed meanwhile (the close wakes us up).
    let listener = PORT_MAP
        .get_listener_ref(port)
        .ok_or_else(|| errno!(EINVAL, "the listener is no longer bound"))?;

    loop {
        let request = listener.pop_incoming()?;
        let mut state = request.lock_state();
        if *state == RequestState::Expired {
            // The connector timed out; the admit path garbage-collects it.
            trace!("accept: dropping an expired connection request");
            continue;
        }

        let peer_socket = request.peer().clone();
        let peer_port = match &*peer_socket.inner() {
            Status::Unbound { port } => *port,
            _ => return_errno!(EINVAL, "the connecting socket is no longer unbound"),
        };

        // The server side gets its own socket and descriptor
        let server_socket = Socket::new(peer_port);
        let server_fd = current!()
            .process()
            .files()
            .lock()
            .unwrap()
            .put(Arc::new(SocketFile::new(server_socket.clone())))?;

        // Two pipes, one per direction
        let size = crate::config::get().pipe_buffer_size;
        let (conn_read, server_write) = pipe(size);
        let (server_read, conn_write) = pipe(size);
        *peer_socket.inner() = Status::Connected(Endpoint {
            reader: Some(Arc::new(conn_read)),
            writer: Some(Arc::new(conn_write)),
        });
        *server_socket.inner() = Status::Connected(Endpoint {
            reader: Some(Arc::new(server_read)),
            writer: Some(Arc::new(server_write)),
        });

        *state = RequestState::Admitted;
        drop(state);
        request.notify_connected();
        debug!("accept: port = {}, peer fd = {}", port, server_fd);
        return Ok(server_fd);
    }
}

/// Shuts down one or both directions of a connected socket.
pub fn do_shutdown(fd: FileDesc, how: ShutdownMode) -> Result<()> {
    let socket = socket_of(fd)?;
    debug!("shutdown: fd = {}, how = {:?}", fd, how);
    socket.shutdown(how)
}

fn socket_of(fd: FileDesc) -> Result<Arc<Socket>> {
    let file = current!().process().files().lock().unwrap().get(fd)?;
    let socket_file = file
        .as_any()
        .downcast_ref::<SocketFile>()
        .ok_or_else(|| errno!(EBADF, "the descriptor is not a socket"))?;
    Ok(socket_file.socket().clone())
}
