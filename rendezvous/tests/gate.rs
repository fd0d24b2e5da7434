use rendezvous::{FileFlag, FlagState, FlagStore, Gate, GateConfig, MemoryFlag, Role, WaitOptions};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Barrier, Mutex,
    },
    thread,
    time::Duration,
};

/// A memory flag that records every observation and write in order.
#[derive(Clone, Default)]
struct RecordingFlag {
    inner: MemoryFlag,
    events: Arc<Mutex<Vec<String>>>,
}

impl FlagStore for RecordingFlag {
    fn read(&self) -> rendezvous::Result<FlagState> {
        let state = self.inner.read()?;
        if state != FlagState::Absent {
            self.events.lock().unwrap().push(format!("read {}", state));
        }
        Ok(state)
    }

    fn write(&self, state: &FlagState) -> rendezvous::Result<()> {
        let mut events = self.events.lock().unwrap();
        events.push(format!("write {}", state));
        self.inner.write(state)
    }

    fn remove(&self) -> rendezvous::Result<()> {
        self.inner.remove()
    }
}

#[test]
fn followers_pass_only_after_leader_prepared() {
    const FOLLOWERS: usize = 4;

    let flag = RecordingFlag::default();
    let prepared = Arc::new(AtomicBool::new(false));
    let passed = Arc::new(AtomicUsize::new(0));
    let start = Arc::new(Barrier::new(FOLLOWERS + 1));
    let options = WaitOptions::default()
        .poll_interval(Duration::from_millis(5))
        .timeout(Duration::from_secs(10));

    let followers: Vec<_> = (1..=FOLLOWERS)
        .map(|rank| {
            let flag = flag.clone();
            let prepared = prepared.clone();
            let passed = passed.clone();
            let start = start.clone();
            let options = options.clone();

            thread::spawn(move || {
                let mut gate = Gate::new(flag);
                start.wait();
                gate.pass(Role::from_rank(rank), &options, || -> anyhow::Result<()> {
                    unreachable!("followers never prepare")
                })
                .unwrap();
                assert!(prepared.load(Ordering::SeqCst));
                passed.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let mut leader = Gate::new(flag.clone());
    start.wait();
    leader
        .run_as_leader(|| {
            thread::sleep(Duration::from_millis(50));
            assert_eq!(passed.load(Ordering::SeqCst), 0);
            prepared.store(true, Ordering::SeqCst);
            anyhow::Ok(())
        })
        .unwrap();

    for handle in followers {
        handle.join().unwrap();
    }
    assert_eq!(passed.load(Ordering::SeqCst), FOLLOWERS);

    let events = flag.events.lock().unwrap().clone();
    assert_eq!(events[0], "write ready");
    assert_eq!(events.len(), FOLLOWERS + 1);
    assert!(events[1..].iter().all(|event| event == "read ready"));

    leader.release().unwrap();
    leader.release().unwrap();
    assert_eq!(flag.read().unwrap(), FlagState::Absent);
}

#[test]
fn file_gate_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let config = GateConfig {
        flag_dir: Some(dir.path().to_path_buf()),
        poll_interval_ms: 5,
        timeout_ms: Some(10_000),
    };
    let options = config.wait_options(None);

    let follower = {
        let flag = config.flag("job-7").unwrap();
        let options = options.clone();
        thread::spawn(move || Gate::new(flag).wait_as_follower(&options))
    };

    let mut leader = Gate::new(config.flag("job-7").unwrap());
    leader
        .run_as_leader(|| {
            thread::sleep(Duration::from_millis(20));
            anyhow::Ok(())
        })
        .unwrap();
    follower.join().unwrap().unwrap();

    leader.release().unwrap();
    assert!(!FileFlag::new(dir.path(), "job-7").path().exists());
}

#[test]
fn leader_failure_releases_waiting_followers() {
    let flag = MemoryFlag::new();
    let options = WaitOptions::default().poll_interval(Duration::from_millis(5));

    let follower = {
        let flag = flag.clone();
        thread::spawn(move || Gate::new(flag).wait_as_follower(&options))
    };

    let mut leader = Gate::new(flag);
    let result = leader.run_as_leader(|| Err(anyhow::anyhow!("disk quota exceeded")));
    assert!(matches!(result, Err(rendezvous::Error::PreparationFailed(_))));

    match follower.join().unwrap() {
        Err(rendezvous::Error::LeaderFailed(msg)) => assert!(msg.contains("disk quota")),
        other => panic!("unexpected result {:?}", other),
    }
}
