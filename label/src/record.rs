use crate::{common::*, Region};

/// How the regions were laid out in the answer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// A single bare object, `{"bbox_2d": [...], "label": ...}`.
    Single,
    /// An array of region objects.
    List,
}

/// One visual grounding example: an image and the regions found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub image: String,
    /// The question asked about the image, if any.
    pub prompt: Option<String>,
    pub regions: Vec<Region>,
    pub layout: Layout,
}

impl AnnotationRecord {
    pub fn new(image: impl Into<String>, regions: Vec<Region>) -> Self {
        Self {
            image: image.into(),
            prompt: None,
            regions,
            layout: Layout::List,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }

    /// The coordinate system shared by the regions, or `None` for an empty record.
    pub fn system(&self) -> Option<CoordinateSystem> {
        self.regions.first().map(|region| region.system)
    }

    /// Checks that all regions share one coordinate system and every region is well formed.
    pub fn validate(&self) -> Result<()> {
        if let Some(first) = self.system() {
            if let Some(other) = self.regions.iter().find(|region| region.system != first) {
                return Err(Error::InconsistentCoordinateSystem {
                    first,
                    second: other.system,
                });
            }
        }
        self.regions.iter().try_for_each(|region| region.validate())
    }

    /// True iff [AnnotationRecord::validate] succeeds.
    pub fn is_consistent(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn to_relative(&self, size: ImageSize) -> Self {
        self.map_regions(|region| region.to_relative(size))
    }

    pub fn to_absolute(&self, size: ImageSize) -> Self {
        self.map_regions(|region| region.to_absolute(size))
    }

    pub fn convert(&self, target: CoordinateSystem, size: ImageSize) -> Self {
        self.map_regions(|region| region.convert(target, size))
    }

    pub fn rescale(&self, original: ImageSize, resized: ImageSize) -> Self {
        self.map_regions(|region| region.rescale(original, resized))
    }

    /// Guesses the coordinate system from the values alone.
    ///
    /// Any coordinate above 1000 can only be a pixel value. Otherwise the
    /// data is ambiguous and `None` is returned.
    pub fn guess_system(&self) -> Option<CoordinateSystem> {
        self.regions
            .iter()
            .any(|region| region.geometry.max_coord() > RELATIVE_SCALE)
            .then(|| CoordinateSystem::Absolute)
    }

    fn map_regions<F>(&self, f: F) -> Self
    where
        F: FnMut(&Region) -> Region,
    {
        Self {
            image: self.image.clone(),
            prompt: self.prompt.clone(),
            regions: self.regions.iter().map(f).collect(),
            layout: self.layout,
        }
    }
}
