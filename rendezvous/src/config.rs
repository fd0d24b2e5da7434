use crate::{common::*, CancelToken, FileFlag, WaitOptions, DEFAULT_POLL_INTERVAL};

/// Gate options as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// A directory visible to every node, e.g. on a shared filesystem.
    ///
    /// There is no fallback. A node-local directory would leave followers on
    /// other nodes waiting for a flag they can never see.
    #[serde(default)]
    pub flag_dir: Option<PathBuf>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Unbounded wait when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl GateConfig {
    /// The flag for `run_id`, failing with [Error::MissingFlagDir] when no directory is set.
    pub fn flag(&self, run_id: &str) -> Result<FileFlag> {
        let dir = self.flag_dir.as_ref().ok_or(Error::MissingFlagDir)?;
        Ok(FileFlag::new(dir, run_id))
    }

    pub fn wait_options(&self, cancel: Option<CancelToken>) -> WaitOptions {
        WaitOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout_ms.map(Duration::from_millis),
            cancel,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            flag_dir: None,
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: None,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}
