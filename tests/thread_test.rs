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
fn join_delivers_the_exit_value() {
    let status = run_kernel(|_: &[u8]| {
        let tid = do_create_thread(Box::new(|_: &[u8]| 7), vec![]).unwrap();
        assert_eq!(do_thread_join(tid).unwrap(), 7);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn thread_arguments_are_moved_into_the_thread() {
    let status = run_kernel(|_: &[u8]| {
        let task = Box::new(|args: &[u8]| args.iter().map(|b| *b as i32).sum());
        let tid = do_create_thread(task, vec![1, 2, 3]).unwrap();
        assert_eq!(do_thread_join(tid).unwrap(), 6);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn two_joiners_both_get_the_exit_value() {
    let status = run_kernel(|_: &[u8]| {
        let target = do_create_thread(
            Box::new(|_: &[u8]| {
                thread::sleep(Duration::from_millis(50));
                7
            }),
            vec![],
        )
        .unwrap();
        let first = do_create_thread(
            Box::new(move |_: &[u8]| do_thread_join(target).unwrap()),
            vec![],
        )
        .unwrap();
        let second = do_create_thread(
            Box::new(move |_: &[u8]| do_thread_join(target).unwrap()),
            vec![],
        )
        .unwrap();
        assert_eq!(do_thread_join(first).unwrap(), 7);
        assert_eq!(do_thread_join(second).unwrap(), 7);
        // The last joiner unlinked the target's handle
        assert_eq!(do_thread_join(target).unwrap_err().errno(), Errno::ESRCH);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn detach_disables_join() {
    let status = run_kernel(|_: &[u8]| {
        let [r, w] = do_pipe().unwrap();
        let target = do_create_thread(
            Box::new(move |_: &[u8]| {
                let mut buf = [0u8; 1];
                // Parks the thread until the writer closes
                do_read(r, &mut buf).unwrap() as i32
            }),
            vec![],
        )
        .unwrap();
        let joiner = do_create_thread(
            Box::new(move |_: &[u8]| match do_thread_join(target) {
                Err(e) if e.errno() == Errno::EINVAL => 1,
                _ => 0,
            }),
            vec![],
        )
        .unwrap();
        thread::sleep(Duration::from_millis(50));
        do_thread_detach(target).unwrap();
        // The in-flight join fails...
        assert_eq!(do_thread_join(joiner).unwrap(), 1);
        // ...and so does any later one
        assert_eq!(do_thread_join(target).unwrap_err().errno(), Errno::EINVAL);
        do_close(w).unwrap();
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn join_rejects_self_and_strangers() {
    let status = run_kernel(|_: &[u8]| {
        let err = do_thread_join(do_thread_self()).unwrap_err();
        assert_eq!(err.errno(), Errno::EDEADLK);
        assert_eq!(do_thread_join(999_999).unwrap_err().errno(), Errno::ESRCH);
        assert_eq!(do_thread_detach(999_999).unwrap_err().errno(), Errno::ESRCH);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn an_exited_thread_cannot_be_detached_but_can_be_joined() {
    let status = run_kernel(|_: &[u8]| {
        let tid = do_create_thread(Box::new(|_: &[u8]| 3), vec![]).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(do_thread_detach(tid).unwrap_err().errno(), Errno::EINVAL);
        assert_eq!(do_thread_join(tid).unwrap(), 3);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn thread_exit_cuts_the_task_short() {
    let status = run_kernel(|_: &[u8]| {
        let tid = do_create_thread(Box::new(|_: &[u8]| thread_exit(9)), vec![]).unwrap();
        assert_eq!(do_thread_join(tid).unwrap(), 9);
        0
    });
    assert_eq!(status, 0);
}

#[test]
fn tids_are_scoped_to_their_process() {
    let status = run_kernel(|_: &[u8]| {
        let tid = do_create_thread(
            Box::new(|_: &[u8]| {
                thread::sleep(Duration::from_millis(100));
                0
            }),
            vec![],
        )
        .unwrap();
        let child = do_exec(
            Box::new(move |_: &[u8]| match do_thread_join(tid) {
                Err(e) if e.errno() == Errno::ESRCH => 0,
                _ => 1,
            }),
            b"",
        )
        .unwrap();
        let (_, code) = do_wait_child(ProcessFilter::WithPid(child)).unwrap();
        assert_eq!(code, 0);
        assert_eq!(do_thread_join(tid).unwrap(), 0);
        0
    });
    assert_eq!(status, 0);
}
