//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use bbox::{smart_resize, CoordinateSystem, ImageSize, ResizeConfig};
pub use indexmap::IndexMap;
pub use label::{load_samples, save_samples, AnnotationRecord, ModelFamily, Sample};
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use rendezvous::{Gate, GateConfig, Role};
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value;
pub use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process,
    str::FromStr,
    time::Duration,
};
pub use tracing::{debug, info, warn};
