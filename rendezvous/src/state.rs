use crate::common::*;

/// What participants can observe through the shared flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagState {
    /// Not written yet, or removed after the run.
    Absent,
    Ready,
    /// The leader's preparation failed with this message.
    Failed(String),
}

impl FlagState {
    const READY: &'static str = "ready";
    const FAILED_PREFIX: &'static str = "failed:";

    /// The flag file content for this state. `Absent` has none.
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Ready => Some(format!("{}\n", Self::READY)),
            Self::Failed(msg) => Some(format!("{} {}\n", Self::FAILED_PREFIX, msg)),
        }
    }

    /// Parses flag file content.
    ///
    /// An empty file counts as ready, so flags created by `touch` keep working.
    pub fn decode(content: &str) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() || content == Self::READY {
            Some(Self::Ready)
        } else {
            content
                .strip_prefix(Self::FAILED_PREFIX)
                .map(|msg| Self::Failed(msg.trim().to_string()))
        }
    }
}

impl fmt::Display for FlagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("absent"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(msg) => write!(f, "failed ({})", msg),
        }
    }
}
