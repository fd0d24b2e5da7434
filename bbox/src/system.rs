use crate::common::*;

/// The upper bound of the scale-invariant coordinate space.
pub const RELATIVE_SCALE: u32 = 1000;

/// The unit in which region coordinates are expressed.
///
/// The data never says which one applies; it is chosen by the target model
/// family and passed in alongside the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Pixels of the original, un-resized image.
    Absolute,
    /// Units in `[0, 1000]` spanning the full image extent.
    #[serde(rename = "relative_1000")]
    RelativeThousand,
}

impl CoordinateSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::RelativeThousand => "relative_1000",
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordinateSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "relative_1000" | "relative" => Ok(Self::RelativeThousand),
            _ => Err(format!(
                "unknown coordinate system '{}', expect 'absolute' or 'relative_1000'",
                s
            )),
        }
    }
}
