use crate::{common::*, FlagState, FlagStore};

/// The default time between two follower polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The part a process plays at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Leader,
    Follower,
}

impl Role {
    /// Rank 0 leads; every other rank follows.
    pub fn from_rank(rank: usize) -> Self {
        if rank == 0 {
            Self::Leader
        } else {
            Self::Follower
        }
    }
}

/// The leader-side progress through the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    NotReady,
    /// Preparation is running. Only the leader sees this.
    Preparing,
    Ready,
    Failed,
    Released,
}

/// A handle that makes a waiting follower give up.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// How a follower waits for the leader.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Unbounded when `None`.
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            cancel: None,
        }
    }
}

impl WaitOptions {
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// A single-writer barrier over a [FlagStore].
#[derive(Debug)]
pub struct Gate<S> {
    store: S,
    state: GateState,
}

impl<S> Gate<S>
where
    S: FlagStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: GateState::NotReady,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Runs `prepare` once and publishes its outcome.
    ///
    /// A stale flag from an earlier attempt is removed first. Followers that
    /// poll before the removal may still observe it.
    ///
    /// On success the flag becomes ready. On failure the flag records the
    /// error so that followers stop waiting, and the error is returned as
    /// [Error::PreparationFailed].
    pub fn run_as_leader<F, E>(&mut self, prepare: F) -> Result<()>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<anyhow::Error>,
    {
        // a requeued run reuses its id, so clear what the last attempt left
        self.store.remove()?;
        self.state = GateState::Preparing;
        info!("leader starts preparation");
        let since = Instant::now();

        match prepare() {
            Ok(()) => {
                self.store.write(&FlagState::Ready)?;
                self.state = GateState::Ready;
                info!("leader finished preparation in {:?}", since.elapsed());
                Ok(())
            }
            Err(err) => {
                let err: anyhow::Error = err.into();
                self.state = GateState::Failed;
                warn!("leader preparation failed: {:#}", err);
                if let Err(write_err) = self.store.write(&FlagState::Failed(format!("{:#}", err))) {
                    warn!("unable to publish failure flag: {}", write_err);
                }
                Err(Error::PreparationFailed(err))
            }
        }
    }

    /// Blocks until the leader publishes ready.
    ///
    /// Returns [Error::LeaderFailed] as soon as the failure flag is seen,
    /// [Error::Timeout] once `options.timeout` has passed and
    /// [Error::Cancelled] when the cancel token fires. A timeout too large
    /// to form a deadline waits without bound.
    pub fn wait_as_follower(&self, options: &WaitOptions) -> Result<()> {
        let since = Instant::now();
        let deadline = options
            .timeout
            .and_then(|timeout| since.checked_add(timeout));
        let mut polls: u64 = 0;

        loop {
            polls += 1;
            match self.store.read()? {
                FlagState::Ready => {
                    info!(
                        "leader is ready after {:?} ({} polls)",
                        since.elapsed(),
                        polls
                    );
                    return Ok(());
                }
                FlagState::Failed(msg) => return Err(Error::LeaderFailed(msg)),
                FlagState::Absent => trace!("flag absent on poll {}", polls),
            }

            if options
                .cancel
                .as_ref()
                .map_or(false, |token| token.is_cancelled())
            {
                return Err(Error::Cancelled);
            }

            let sleep = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::Timeout(since.elapsed()));
                    }
                    options.poll_interval.min(deadline - now)
                }
                None => options.poll_interval,
            };
            thread::sleep(sleep);
        }
    }

    /// Removes the flag at the end of the run. Safe to call more than once.
    pub fn release(&mut self) -> Result<()> {
        self.store.remove()?;
        self.state = GateState::Released;
        debug!("gate released");
        Ok(())
    }

    /// Leads or follows depending on `role`.
    ///
    /// Followers never call `prepare`.
    pub fn pass<F, E>(&mut self, role: Role, options: &WaitOptions, prepare: F) -> Result<()>
    where
        F: FnOnce() -> Result<(), E>,
        E: Into<anyhow::Error>,
    {
        match role {
            Role::Leader => self.run_as_leader(prepare),
            Role::Follower => {
                self.wait_as_follower(options)?;
                self.state = GateState::Ready;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFlag;

    fn fast() -> WaitOptions {
        WaitOptions::default().poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn leader_publishes_ready() {
        let flag = MemoryFlag::new();
        let mut gate = Gate::new(flag.clone());
        assert_eq!(gate.state(), GateState::NotReady);

        gate.run_as_leader(|| anyhow::Ok(())).unwrap();
        assert_eq!(gate.state(), GateState::Ready);
        assert_eq!(flag.read().unwrap(), FlagState::Ready);
    }

    #[test]
    fn failed_preparation_is_published() {
        let flag = MemoryFlag::new();
        let mut gate = Gate::new(flag.clone());

        let result = gate.run_as_leader(|| Err(anyhow::anyhow!("download failed")));
        assert!(matches!(result, Err(Error::PreparationFailed(_))));
        assert_eq!(gate.state(), GateState::Failed);

        let follower = Gate::new(flag);
        match follower.wait_as_follower(&fast()) {
            Err(Error::LeaderFailed(msg)) => assert_eq!(msg, "download failed"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn follower_times_out() {
        let gate = Gate::new(MemoryFlag::new());
        let since = Instant::now();
        let result = gate.wait_as_follower(&fast().timeout(Duration::from_millis(30)));
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(since.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn huge_timeout_waits_without_bound() {
        let flag = MemoryFlag::new();
        flag.write(&FlagState::Ready).unwrap();
        let gate = Gate::new(flag);
        gate.wait_as_follower(&fast().timeout(Duration::from_secs(u64::MAX)))
            .unwrap();
        gate.wait_as_follower(&fast().timeout(Duration::MAX)).unwrap();
    }

    #[test]
    fn leader_clears_stale_flag() {
        let flag = MemoryFlag::new();
        flag.write(&FlagState::Failed("previous attempt".into()))
            .unwrap();
        let mut gate = Gate::new(flag.clone());

        let mut seen = None;
        gate.run_as_leader(|| {
            seen = Some(flag.read()?);
            anyhow::Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(FlagState::Absent));
        assert_eq!(flag.read().unwrap(), FlagState::Ready);
    }

    #[test]
    fn follower_can_be_cancelled() {
        let gate = Gate::new(MemoryFlag::new());
        let token = CancelToken::new();
        token.cancel();
        let result = gate.wait_as_follower(&fast().cancel(token));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn release_is_idempotent() {
        let flag = MemoryFlag::new();
        let mut gate = Gate::new(flag.clone());
        gate.run_as_leader(|| anyhow::Ok(())).unwrap();

        gate.release().unwrap();
        gate.release().unwrap();
        assert_eq!(gate.state(), GateState::Released);
        assert_eq!(flag.read().unwrap(), FlagState::Absent);
    }

    #[test]
    fn followers_skip_preparation() {
        let flag = MemoryFlag::new();
        flag.write(&FlagState::Ready).unwrap();
        let mut gate = Gate::new(flag);
        gate.pass(Role::Follower, &fast(), || -> anyhow::Result<()> {
            panic!("followers must not prepare")
        })
        .unwrap();
        assert_eq!(gate.state(), GateState::Ready);
        assert_eq!(Role::from_rank(0), Role::Leader);
        assert_eq!(Role::from_rank(3), Role::Follower);
    }
}
