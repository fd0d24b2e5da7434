use crate::{common::*, FlagState};

/// A shared medium holding a single flag.
///
/// Implementations need no locking as long as one process writes and the
/// written value is observed atomically.
pub trait FlagStore {
    fn read(&self) -> Result<FlagState>;

    /// Publishes a final state. Writing [FlagState::Absent] removes the flag.
    fn write(&self, state: &FlagState) -> Result<()>;

    /// Removes the flag. Removing an absent flag is not an error.
    fn remove(&self) -> Result<()>;
}

impl<S> FlagStore for &S
where
    S: FlagStore + ?Sized,
{
    fn read(&self) -> Result<FlagState> {
        (**self).read()
    }

    fn write(&self, state: &FlagState) -> Result<()> {
        (**self).write(state)
    }

    fn remove(&self) -> Result<()> {
        (**self).remove()
    }
}

/// A flag file on a filesystem shared by all nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileFlag {
    path: PathBuf,
}

impl FileFlag {
    /// The flag for `run_id` under `dir`, e.g. `<dir>/rendezvous-<run_id>.flag`.
    pub fn new(dir: impl AsRef<Path>, run_id: &str) -> Self {
        let path = dir.as_ref().join(format!("rendezvous-{}.flag", run_id));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}", std::process::id()));
        self.path.with_file_name(name)
    }
}

impl FlagStore for FileFlag {
    fn read(&self) -> Result<FlagState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(FlagState::Absent),
            Err(err) => return Err(err.into()),
        };
        FlagState::decode(&content).ok_or_else(|| Error::CorruptFlag {
            path: self.path.clone(),
            content,
        })
    }

    fn write(&self, state: &FlagState) -> Result<()> {
        let content = match state.encode() {
            Some(content) => content,
            None => return self.remove(),
        };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        // write aside and rename so readers never see a partial file
        let temp_path = self.temp_path();
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        debug!("wrote flag '{}' as {}", self.path.display(), state);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// An in-process flag, shared by cloning.
#[derive(Debug, Clone)]
pub struct MemoryFlag {
    state: Arc<Mutex<FlagState>>,
}

impl MemoryFlag {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FlagState::Absent)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlagState> {
        // the guarded value is always a complete state, so poisoning is harmless
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Default for MemoryFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagStore for MemoryFlag {
    fn read(&self) -> Result<FlagState> {
        Ok(self.lock().clone())
    }

    fn write(&self, state: &FlagState) -> Result<()> {
        *self.lock() = state.clone();
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.lock() = FlagState::Absent;
        Ok(())
    }
}
