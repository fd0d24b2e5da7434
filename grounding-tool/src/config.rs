//! Tool configuration format.

use crate::{common::*, dataset::DatasetConfig};

/// The main configuration, usually stored as `grounding.json5`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The model family the data is prepared for.
    pub model_family: Option<ModelFamily>,
    /// Overrides the coordinate system implied by `model_family`.
    pub coordinate_system: Option<CoordinateSystem>,
    /// Named datasets that can be selected with an optional `%NN` sampling suffix.
    #[serde(default)]
    pub datasets: IndexMap<String, DatasetConfig>,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub resize: ResizeConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }

    /// The coordinate system of the target model, if configured.
    pub fn coordinate_system(&self) -> Option<CoordinateSystem> {
        self.coordinate_system
            .or_else(|| self.model_family.map(|family| family.coordinate_system()))
    }
}
