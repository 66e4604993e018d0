use teachos::*;

fn run_kernel<F>(init: F) -> i32
where
    F: FnOnce(&[u8]) -> i32 + Send + 'static,
{
    boot(KernelConfig::default(), Box::new(init), b"").expect("the kernel failed to boot")
}

#[test]
fn pipe_loopback_then_eof() {
    let status = run_kernel(|_: &[u8]| {
        let [r, w] = do_pipe().unwrap();
        assert_eq!(do_write(w, b"hello").unwrap(), 5);
        do_close(w).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(do_read(r, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(do_read(r, &mut buf).unwrap(), 0);
        do_close(r).unwrap();
        // Closed descriptors stay closed
        assert_eq!(do_read(r, &mut buf).unwrap_err().errno(), Errno::EBADF);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn pipe_halves_only_work_in_their_direction() {
    let status = run_kernel(|_: &[u8]| {
        let [r, w] = do_pipe().unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(do_read(w, &mut buf).unwrap_err().errno(), Errno::EBADF);
        assert_eq!(do_write(r, b"x").unwrap_err().errno(), Errno::EBADF);
        do_close(r).unwrap();
        // The reader is gone: writes break
        assert_eq!(do_write(w, b"x").unwrap_err().errno(), Errno::EPIPE);
        do_close(w).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn descriptors_are_inherited_and_refcounted() {
    let status = run_kernel(|_: &[u8]| {
        let [r, w] = do_pipe().unwrap();
        let child = do_exec(
            Box::new(move |_: &[u8]| {
                do_close(r).unwrap();
                assert_eq!(do_write(w, b"from the child").unwrap(), 14);
                // The child's exit releases its copy of the writer
                0
            }),
            b"",
        )
        .unwrap();
        // The parent must drop its own writer too, or EOF never comes
        do_close(w).unwrap();
        let mut collected = Vec::new();
        loop {
            let mut buf = [0u8; 8];
            let n = do_read(r, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(collected, b"from the child");
        do_wait_child(ProcessFilter::WithPid(child)).unwrap();
        do_close(r).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn a_tiny_ring_still_streams_everything() {
    let config = KernelConfig {
        pipe_buffer_size: 8,
        ..KernelConfig::default()
    };
    let status = boot(
        config,
        Box::new(|_: &[u8]| {
            let [r, w] = do_pipe().unwrap();
            let writer = do_create_thread(
                Box::new(move |_: &[u8]| {
                    let payload = b"abcdefghijkl";
                    let mut written = 0;
                    while written < payload.len() {
                        written += do_write(w, &payload[written..]).unwrap();
                    }
                    do_close(w).unwrap();
                    written as i32
                }),
                vec![],
            )
            .unwrap();
            let mut collected = Vec::new();
            loop {
                let mut buf = [0u8; 4];
                let n = do_read(r, &mut buf).unwrap();
                if n == 0 {
                    break;
                }
                collected.extend_from_slice(&buf[..n]);
            }
            assert_eq!(collected, b"abcdefghijkl");
            assert_eq!(do_thread_join(writer).unwrap(), 12);
            do_close(r).unwrap();
            0
        }),
        b"",
    )
    .unwrap();
    assert_eq!(status, 0);
}

#[test]
fn pipe_reserves_both_descriptors_or_neither() {
    let config = KernelConfig {
        max_fileid: 1,
        ..KernelConfig::default()
    };
    let status = boot(
        config,
        Box::new(|_: &[u8]| {
            let err = do_pipe().unwrap_err();
            assert_eq!(err.errno(), Errno::EMFILE);
            // The read fd was rolled back, so a single reservation fits
            let fd = do_open_info().unwrap();
            do_close(fd).unwrap();
            0
        }),
        b"",
    )
    .unwrap();
    assert_eq!(status, 0);
}
