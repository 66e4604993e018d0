use std::thread;
use std::time::Duration;

use teachos::*;

fn run_kernel<F>(init: F) -> i32
where
    F: FnOnce(&[u8]) -> i32 + Send + 'static,
{
    boot(KernelConfig::default(), Box::new(init), b"").expect("the kernel failed to boot")
}

#[test]
fn socket_rendezvous_carries_bytes_both_ways() {
    let status = run_kernel(|_: &[u8]| {
        let listener = do_socket(42).unwrap();
        do_listen(listener).unwrap();
        let client = do_exec(
            Box::new(|_: &[u8]| {
                let c = do_socket(0).unwrap();
                do_connect(c, 42, 1000).unwrap();
                assert_eq!(do_write(c, b"ping").unwrap(), 4);
                let mut buf = [0u8; 4];
                assert_eq!(do_read(c, &mut buf).unwrap(), 4);
                assert_eq!(&buf, b"pong");
                // The server shut its write direction down: EOF follows
                assert_eq!(do_read(c, &mut buf).unwrap(), 0);
                do_close(c).unwrap();
                0
            }),
            b"",
        )
        .unwrap();
        let peer = do_accept(listener).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(do_read(peer, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"ping");
        assert_eq!(do_write(peer, b"pong").unwrap(), 4);
        do_shutdown(peer, ShutdownMode::WRITE).unwrap();
        let (_, code) = do_wait_child(ProcessFilter::WithPid(client)).unwrap();
        assert_eq!(code, 0);
        do_close(peer).unwrap();
        do_close(listener).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn connect_times_out_and_expired_requests_are_never_admitted() {
    let status = run_kernel(|_: &[u8]| {
        // No listener at all
        let c = do_socket(0).unwrap();
        assert_eq!(
            do_connect(c, 99, 50).unwrap_err().errno(),
            Errno::ECONNREFUSED
        );
        do_close(c).unwrap();

        let listener = do_socket(99).unwrap();
        do_listen(listener).unwrap();

        // A listener that never accepts: the connect expires
        let first = do_exec(
            Box::new(|_: &[u8]| {
                let c = do_socket(0).unwrap();
                match do_connect(c, 99, 50) {
                    Err(e) if e.errno() == Errno::ETIMEDOUT => 0,
                    _ => 1,
                }
            }),
            b"",
        )
        .unwrap();
        let (_, code) = do_wait_child(ProcessFilter::WithPid(first)).unwrap();
        assert_eq!(code, 0);

        // The expired request is still queued; accept must skip it and
        // admit the fresh connector instead
        let second = do_exec(
            Box::new(|_: &[u8]| {
                let c = do_socket(0).unwrap();
                do_connect(c, 99, 2000).unwrap();
                let mut buf = [0u8; 2];
                assert_eq!(do_read(c, &mut buf).unwrap(), 2);
                assert_eq!(&buf, b"ok");
                0
            }),
            b"",
        )
        .unwrap();
        let peer = do_accept(listener).unwrap();
        assert_eq!(do_write(peer, b"ok").unwrap(), 2);
        let (_, code) = do_wait_child(ProcessFilter::WithPid(second)).unwrap();
        assert_eq!(code, 0);
        do_close(peer).unwrap();
        do_close(listener).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn a_port_has_at_most_one_listener() {
    let status = run_kernel(|_: &[u8]| {
        let first = do_socket(7).unwrap();
        do_listen(first).unwrap();
        let second = do_socket(7).unwrap();
        assert_eq!(do_listen(second).unwrap_err().errno(), Errno::EADDRINUSE);
        // Closing the listener frees the port
        do_close(first).unwrap();
        do_listen(second).unwrap();
        do_close(second).unwrap();
        let third = do_socket(7).unwrap();
        do_listen(third).unwrap();
        do_close(third).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn closing_the_listener_fails_a_blocked_accept() {
    let status = run_kernel(|_: &[u8]| {
        let listener = do_socket(9).unwrap();
        do_listen(listener).unwrap();
        let accepter = do_create_thread(
            Box::new(move |_: &[u8]| match do_accept(listener) {
                Err(e) if e.errno() == Errno::EINVAL => 1,
                _ => 0,
            }),
            vec![],
        )
        .unwrap();
        thread::sleep(Duration::from_millis(50));
        do_close(listener).unwrap();
        assert_eq!(do_thread_join(accepter).unwrap(), 1);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn wrong_state_operations_are_rejected() {
    let status = run_kernel(|_: &[u8]| {
        // Beyond the configured port range
        assert_eq!(do_socket(60_000).unwrap_err().errno(), Errno::EINVAL);

        let s = do_socket(0).unwrap();
        // Port 0 can never listen
        assert_eq!(do_listen(s).unwrap_err().errno(), Errno::EINVAL);
        let mut buf = [0u8; 1];
        assert_eq!(do_read(s, &mut buf).unwrap_err().errno(), Errno::ENOTCONN);
        assert_eq!(do_write(s, b"x").unwrap_err().errno(), Errno::ENOTCONN);
        assert_eq!(
            do_shutdown(s, ShutdownMode::BOTH).unwrap_err().errno(),
            Errno::ENOTCONN
        );
        do_close(s).unwrap();

        let l = do_socket(5).unwrap();
        do_listen(l).unwrap();
        assert_eq!(do_listen(l).unwrap_err().errno(), Errno::EINVAL);
        assert_eq!(do_connect(l, 5, 10).unwrap_err().errno(), Errno::EINVAL);

        // A pipe descriptor is no socket
        let [r, w] = do_pipe().unwrap();
        assert_eq!(do_accept(r).unwrap_err().errno(), Errno::EBADF);
        do_close(r).unwrap();
        do_close(w).unwrap();
        do_close(l).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn shutdown_read_stops_reads_only() {
    let status = run_kernel(|_: &[u8]| {
        let listener = do_socket(11).unwrap();
        do_listen(listener).unwrap();
        let child = do_exec(
            Box::new(|_: &[u8]| {
                let c = do_socket(0).unwrap();
                do_connect(c, 11, 1000).unwrap();
                do_shutdown(c, ShutdownMode::READ).unwrap();
                let mut buf = [0u8; 1];
                assert_eq!(do_read(c, &mut buf).unwrap_err().errno(), Errno::EBADF);
                // The write direction still works
                assert_eq!(do_write(c, b"x").unwrap(), 1);
                0
            }),
            b"",
        )
        .unwrap();
        let peer = do_accept(listener).unwrap();
        let mut buf = [0u8; 1];
        assert_eq!(do_read(peer, &mut buf).unwrap(), 1);
        assert_eq!(&buf, b"x");
        // The child's read shutdown killed this direction's reader
        assert_eq!(do_write(peer, b"y").unwrap_err().errno(), Errno::EPIPE);
        let (_, code) = do_wait_child(ProcessFilter::WithPid(child)).unwrap();
        assert_eq!(code, 0);
        do_close(peer).unwrap();
        do_close(listener).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn shutdown_rejects_an_empty_mode() {
    let status = run_kernel(|_: &[u8]| {
        let listener = do_socket(13).unwrap();
        do_listen(listener).unwrap();
        let child = do_exec(
            Box::new(|_: &[u8]| {
                let c = do_socket(0).unwrap();
                do_connect(c, 13, 1000).unwrap();
                let err = do_shutdown(c, ShutdownMode::empty()).unwrap_err();
                assert_eq!(err.errno(), Errno::EINVAL);
                do_shutdown(c, ShutdownMode::BOTH).unwrap();
                let mut buf = [0u8; 1];
                assert_eq!(do_read(c, &mut buf).unwrap_err().errno(), Errno::EBADF);
                assert_eq!(do_write(c, b"x").unwrap_err().errno(), Errno::EBADF);
                0
            }),
            b"",
        )
        .unwrap();
        let peer = do_accept(listener).unwrap();
        // Both directions died with the child's full shutdown
        let mut buf = [0u8; 1];
        assert_eq!(do_read(peer, &mut buf).unwrap(), 0);
        let (_, code) = do_wait_child(ProcessFilter::WithPid(child)).unwrap();
        assert_eq!(code, 0);
        do_close(peer).unwrap();
        do_close(listener).unwrap();
        0
    });
    assert_eq!(status, 0);
}
