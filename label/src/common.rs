pub use crate::error::{Error, Result};
pub use bbox::{
    rounding, CoordinateSystem, ImageSize, Point, Transform, Xyxy, RELATIVE_SCALE,
};
pub use indexmap::IndexMap;
pub use once_cell::sync::Lazy;
pub use regex::Regex;
pub use serde::{Deserialize, Serialize};
pub use serde_json::{Map, Value};
pub use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    num::{NonZeroU32, NonZeroU64},
    path::Path,
    str::FromStr,
};
pub use tracing::{debug, info, warn};
