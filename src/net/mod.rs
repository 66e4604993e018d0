//! Local stream sockets.
//!
//! A socket starts unbound, becomes a listener through `do_listen` or a
//! peer through the `do_connect`/`do_accept` rendezvous, and never leaves
//! either terminal state. A peer is full-duplex: it owns the reading half
//! of one pipe and the writing half of another, with the partner holding
//! the opposite halves.

pub use self::socket::{
    do_accept, do_connect, do_listen, do_shutdown, do_socket, ShutdownMode, Socket,
};
pub use self::socket_file::SocketFile;

mod listener;
mod port_map;
mod socket;
mod socket_file;

#[allow(non_camel_case_types)]
pub type port_t = u16;

/// The "no port" sentinel: a socket created with it can connect but never
/// listen.
pub const NOPORT: port_t = 0;

pub(crate) fn init_port_map(max_port: port_t) {
    port_map::PORT_MAP.init(max_port);
}
