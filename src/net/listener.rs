//! The listener backlog and the connection-request rendezvous object.

use std::time::Duration;

use crate::prelude::*;

use super::socket::Socket;

/// The listening state of a socket, published in the port map.
///
/// The backlog is an explicit FIFO: the condition variable alone gives no
/// ordering, so accepts pop requests in insertion order. `shutdown` refuses
/// new requests and wakes every blocked accept.
pub(super) struct Listener {
    inner: Mutex<ListenerInner>,
    req_available: Condvar,
}

struct ListenerInner {
    backlog: VecDeque<Arc<ConnRequest>>,
    bound: bool,
}

impl Listener {
    pub fn new() -> Listener {
        Listener {
            inner: Mutex::new(ListenerInner {
                backlog: VecDeque::new(),
                bound: true,
            }),
            req_available: Condvar::new(),
        }
    }

    pub fn push_incoming(&self, request: Arc<ConnRequest>) -> Result<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.bound {
                return_errno!(ECONNREFUSED, "the listener is shut down");
            }
            inner.backlog.push_back(request);
        }
        self.req_available.notify_one();
        Ok(())
    }

    /// Pops the oldest pending request, blocking while the backlog is
    /// empty. Fails once the listener is shut down.
    pub fn pop_incoming(&self) -> Result<Arc<ConnRequest>> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if !inner.bound {
                return_errno!(EINVAL, "the listener is shut down");
            }
            if let Some(request) = inner.backlog.pop_front() {
                return Ok(request);
            }
            inner = self.req_available.wait(inner).unwrap();
        }
    }

    /// Called by the listening socket's close path, after the port map
    /// entry is gone. Queued connectors are left to run out their timeouts.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.bound = false;
            inner.backlog.clear();
        }
        self.req_available.notify_all();
    }
}

/// A connector blocked in `do_connect`, queued on a listener.
///
/// The terminal state is decided under the request lock by whichever side
/// gets there first: the accept path admits a pending request, the
/// connector expires one whose timeout elapsed. An admission that races the
/// timeout wins; an expired request is skipped and dropped by accept.
#[derive(Debug)]
pub(super) struct ConnRequest {
    peer: Arc<Socket>,
    state: Mutex<RequestState>,
    connected_cv: Condvar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum RequestState {
    Pending,
    Admitted,
    Expired,
}

impl ConnRequest {
    pub fn new(peer: Arc<Socket>) -> Arc<ConnRequest> {
        Arc::new(ConnRequest {
            peer,
            state: Mutex::new(RequestState::Pending),
            connected_cv: Condvar::new(),
        })
    }

    pub fn peer(&self) -> &Arc<Socket> {
        &self.peer
    }

    pub fn lock_state(&self) -> MutexGuard<'_, RequestState> {
        self.state.lock().unwrap()
    }

    pub fn notify_connected(&self) {
        self.connected_cv.notify_all();
    }

    /// Blocks the connector until the request is admitted or the timeout
    /// elapses, marking the request expired in the latter case.
    pub fn wait_admitted(&self, timeout: Duration) -> Result<()> {
        let state = self.state.lock().unwrap();
        let (mut state, _) = self
            .connected_cv
            .wait_timeout_while(state, timeout, |state| *state == RequestState::Pending)
            .unwrap();
        match *state {
            RequestState::Admitted => Ok(()),
            _ => {
                *state = RequestState::Expired;
                return_errno!(ETIMEDOUT, "the connection was not admitted in time");
            }
        }
    }
}
