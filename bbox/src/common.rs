pub use crate::error::{Error, Result};
pub use num_traits::Num;
pub use serde::{Deserialize, Serialize};
pub use std::{
    fmt,
    num::{NonZeroU32, NonZeroU64},
    ops::Mul,
    str::FromStr,
};
