use crate::common::*;

/// The pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i64; 2]", into = "[u32; 2]")]
pub struct ImageSize {
    w: NonZeroU32,
    h: NonZeroU32,
}

impl ImageSize {
    /// Builds a size from a width and height, both of which must be positive.
    pub fn try_new(width: i64, height: i64) -> Result<Self> {
        let invalid = || Error::InvalidDimension { width, height };
        let w = u32::try_from(width)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(invalid)?;
        let h = u32::try_from(height)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(invalid)?;
        Ok(Self { w, h })
    }

    pub fn w(&self) -> u32 {
        self.w.get()
    }

    pub fn h(&self) -> u32 {
        self.h.get()
    }

    pub fn nonzero_w(&self) -> NonZeroU32 {
        self.w
    }

    pub fn nonzero_h(&self) -> NonZeroU32 {
        self.h
    }

    pub fn area(&self) -> u64 {
        self.w() as u64 * self.h() as u64
    }
}

impl TryFrom<[i64; 2]> for ImageSize {
    type Error = Error;

    fn try_from([w, h]: [i64; 2]) -> Result<Self> {
        Self::try_new(w, h)
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.w(), size.h()]
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}
