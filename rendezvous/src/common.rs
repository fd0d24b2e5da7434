pub use crate::error::{Error, Result};
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};
pub use tracing::{debug, info, trace, warn};
