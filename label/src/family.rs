use crate::common::*;

/// Vision-language model families and the coordinate units they are trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    #[serde(rename = "qwen2_vl")]
    Qwen2Vl,
    #[serde(rename = "qwen2_5_vl")]
    Qwen25Vl,
    #[serde(rename = "qwen3_vl")]
    Qwen3Vl,
}

impl ModelFamily {
    /// Qwen2.5-VL grounds in pixels of the resized image; the others use 0-1000 units.
    pub fn coordinate_system(&self) -> CoordinateSystem {
        match self {
            Self::Qwen25Vl => CoordinateSystem::Absolute,
            Self::Qwen2Vl | Self::Qwen3Vl => CoordinateSystem::RelativeThousand,
        }
    }

    /// Guesses the family from a model name such as `Qwen/Qwen2.5-VL-7B-Instruct`.
    pub fn from_model_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.contains("qwen2.5-vl") || name.contains("qwen2_5_vl") {
            Some(Self::Qwen25Vl)
        } else if name.contains("qwen3-vl") || name.contains("qwen3_vl") {
            Some(Self::Qwen3Vl)
        } else if name.contains("qwen2-vl") || name.contains("qwen2_vl") {
            Some(Self::Qwen2Vl)
        } else {
            None
        }
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_model_name(s).ok_or_else(|| format!("unknown model family '{}'", s))
    }
}
