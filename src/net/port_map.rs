//! The global port space.
//!
//! `PORT_MAP[p]` holds the listener bound to port `p`, if any. Entries are
//! written only by `do_listen` and by a listening socket's close path, so a
//! port has at most one listener at any time.

use crate::prelude::*;

use super::listener::Listener;
use super::{port_t, NOPORT};

lazy_static! {
    pub(super) static ref PORT_MAP: PortMap = PortMap::new();
}

pub(super) struct PortMap {
    entries: Mutex<Vec<Option<Arc<Listener>>>>,
}

impl PortMap {
    fn new() -> PortMap {
        PortMap {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Sizes the map for a fresh boot, discarding leftover entries.
    pub fn init(&self, max_port: port_t) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        entries.resize(max_port as usize + 1, None);
    }

    pub fn add_listener(&self, port: port_t, listener: Arc<Listener>) -> Result<()> {
        debug_assert!(port != NOPORT);
        let mut entries = self.entries.lock().unwrap();
        let slot = entries
            .get_mut(port as usize)
            .ok_or_else(|| errno!(EINVAL, "port out of range"))?;
        if slot.is_some() {
            return_errno!(EADDRINUSE, "the port already has a listener");
        }
        *slot = Some(listener);
        Ok(())
    }

    pub fn get_listener_ref(&self, port: port_t) -> Option<Arc<Listener>> {
        self.entries
            .lock()
            .unwrap()
            .get(port as usize)
            .cloned()
            .flatten()
    }

    pub fn remove_port(&self, port: port_t) {
        if let Some(slot) = self.entries.lock().unwrap().get_mut(port as usize) {
            *slot = None;
        }
    }
}
