//! Dataset registry lookups.

use crate::common::*;

static SAMPLING_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(\d+)$").expect("invalid sampling suffix pattern"));

/// Where a dataset's annotations and images live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub annotation_path: PathBuf,
    /// Image paths in the annotations are relative to this directory.
    pub data_path: PathBuf,
    /// The unit the annotation coordinates are stored in.
    #[serde(default)]
    pub coordinate_system: Option<CoordinateSystem>,
}

/// A dataset name with an optional `%NN` sampling suffix, e.g. `pixmo_relative%50`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub name: String,
    /// The fraction of samples to use, in `(0, 1]` for usual percentages.
    pub sampling_rate: f64,
}

impl FromStr for DatasetSpec {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (name, sampling_rate) = match SAMPLING_SUFFIX.captures(text) {
            Some(caps) => {
                let percent: u32 = caps[1]
                    .parse()
                    .with_context(|| format!("invalid sampling rate in '{}'", text))?;
                let start = caps.get(0).map(|m| m.start()).unwrap_or(text.len());
                (&text[..start], percent as f64 / 100.0)
            }
            None => (text, 1.0),
        };
        ensure!(!name.is_empty(), "empty dataset name in '{}'", text);
        Ok(Self {
            name: name.to_string(),
            sampling_rate,
        })
    }
}

/// A registry entry resolved from a [DatasetSpec].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedDataset {
    pub name: String,
    pub config: DatasetConfig,
    pub sampling_rate: f64,
}

/// Resolves dataset names against the registry, in the given order.
pub fn select_datasets<S>(
    registry: &IndexMap<String, DatasetConfig>,
    names: &[S],
) -> Result<Vec<SelectedDataset>>
where
    S: AsRef<str>,
{
    names
        .iter()
        .map(|text| -> Result<_> {
            let DatasetSpec {
                name,
                sampling_rate,
            } = text.as_ref().parse::<DatasetSpec>()?;
            let config = registry
                .get(&name)
                .ok_or_else(|| format_err!("do not find dataset '{}'", name))?
                .clone();
            Ok(SelectedDataset {
                name,
                config,
                sampling_rate,
            })
        })
        .collect()
}
