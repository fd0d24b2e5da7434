use crate::common::*;

pub const BBOX_KEY: &str = "bbox_2d";
pub const POINT_KEY: &str = "point_2d";
pub const LABEL_KEY: &str = "label";

const RELATIVE_DENOM: NonZeroU32 = match NonZeroU32::new(RELATIVE_SCALE) {
    Some(denom) => denom,
    None => panic!("relative scale must be positive"),
};

/// The spatial part of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    BoundingBox(Xyxy<u32>),
    Point(Point<u32>),
}

impl Geometry {
    /// The JSON key carrying the coordinates.
    pub fn key(&self) -> &'static str {
        match self {
            Self::BoundingBox(_) => BBOX_KEY,
            Self::Point(_) => POINT_KEY,
        }
    }

    pub fn coords(&self) -> Vec<u32> {
        match self {
            Self::BoundingBox(rect) => rect.xyxy().to_vec(),
            Self::Point(point) => point.xy().to_vec(),
        }
    }

    pub fn max_coord(&self) -> u32 {
        self.coords().into_iter().max().unwrap_or(0)
    }

    /// Boxes must keep `x1 < x2` and `y1 < y2`; points are always valid.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::BoundingBox(rect) => rect.is_valid(),
            Self::Point(_) => true,
        }
    }

    fn map_xy<FX, FY>(self, fx: FX, fy: FY) -> Self
    where
        FX: Fn(u32) -> u32,
        FY: Fn(u32) -> u32,
    {
        match self {
            Self::BoundingBox(rect) => Self::BoundingBox(rect.map_xy(&fx, &fy)),
            Self::Point(point) => Self::Point(point.map_xy(fx, fy)),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BoundingBox(rect) => write!(f, "{}: {}", BBOX_KEY, rect),
            Self::Point(point) => write!(f, "{}: {}", POINT_KEY, point),
        }
    }
}

/// A labelled box or point, tagged with the coordinate system it is expressed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub geometry: Geometry,
    pub system: CoordinateSystem,
    pub label: String,
    /// Extra string attributes, kept in file order.
    pub attributes: IndexMap<String, String>,
}

impl Region {
    pub fn bbox(xyxy: [u32; 4], system: CoordinateSystem, label: impl Into<String>) -> Result<Self> {
        let rect = Xyxy::try_from_xyxy(xyxy)?;
        Ok(Self::new(Geometry::BoundingBox(rect), system, label))
    }

    pub fn point(xy: [u32; 2], system: CoordinateSystem, label: impl Into<String>) -> Result<Self> {
        let point = Point::try_from_xy(xy)?;
        Ok(Self::new(Geometry::Point(point), system, label))
    }

    pub fn new(geometry: Geometry, system: CoordinateSystem, label: impl Into<String>) -> Self {
        Self {
            geometry,
            system,
            label: label.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Converts pixel coordinates to the 0-1000 space of `size`.
    ///
    /// Each coordinate becomes `round(x * 1000 / W)` (or `H` for y), rounded
    /// half away from zero and clamped to `[0, 1000]`. Clamping is the policy
    /// for out-of-bounds input, not an error. A region already in relative
    /// form is returned unchanged.
    pub fn to_relative(&self, size: ImageSize) -> Self {
        if self.system == CoordinateSystem::RelativeThousand {
            return self.clone();
        }
        let geometry = self.geometry.map_xy(
            |x| scale(x, RELATIVE_SCALE, size.nonzero_w(), RELATIVE_SCALE),
            |y| scale(y, RELATIVE_SCALE, size.nonzero_h(), RELATIVE_SCALE),
        );
        self.with_geometry(geometry, CoordinateSystem::RelativeThousand)
    }

    /// Converts 0-1000 coordinates to pixels of `size`.
    ///
    /// Each coordinate becomes `round(x * W / 1000)` (or `H` for y), clamped
    /// to `[0, W]` and `[0, H]`. A region already in absolute form is returned
    /// unchanged.
    pub fn to_absolute(&self, size: ImageSize) -> Self {
        if self.system == CoordinateSystem::Absolute {
            return self.clone();
        }
        let geometry = self.geometry.map_xy(
            |x| scale(x, size.w(), RELATIVE_DENOM, size.w()),
            |y| scale(y, size.h(), RELATIVE_DENOM, size.h()),
        );
        self.with_geometry(geometry, CoordinateSystem::Absolute)
    }

    pub fn convert(&self, target: CoordinateSystem, size: ImageSize) -> Self {
        match target {
            CoordinateSystem::Absolute => self.to_absolute(size),
            CoordinateSystem::RelativeThousand => self.to_relative(size),
        }
    }

    /// Follows an image resize from `original` to `resized`.
    ///
    /// Absolute coordinates are scaled by the resize ratio and clamped to the
    /// resized extent. Relative coordinates are scale-invariant and kept.
    pub fn rescale(&self, original: ImageSize, resized: ImageSize) -> Self {
        if self.system == CoordinateSystem::RelativeThousand {
            return self.clone();
        }
        let transform = Transform::from_sizes_exact(original, resized);
        let round_x = |x: f64| rounding::round_f64(x, resized.w());
        let round_y = |y: f64| rounding::round_f64(y, resized.h());

        let geometry = match self.geometry {
            Geometry::BoundingBox(rect) => {
                let rect = &transform * &rect.map(f64::from);
                Geometry::BoundingBox(rect.map_xy(round_x, round_y))
            }
            Geometry::Point(point) => {
                let point = &transform * &point.map_xy(f64::from, f64::from);
                Geometry::Point(point.map_xy(round_x, round_y))
            }
        };
        self.with_geometry(geometry, CoordinateSystem::Absolute)
    }

    /// Checks the box corner order and, for relative regions, the `[0, 1000]` range.
    pub fn validate(&self) -> Result<()> {
        if !self.geometry.is_valid() {
            return Err(Error::malformed_region(format!(
                "degenerate box {} for '{}', x1 < x2 and y1 < y2 must hold",
                self.geometry, self.label
            )));
        }
        if self.system == CoordinateSystem::RelativeThousand {
            let max = self.geometry.max_coord();
            if max > RELATIVE_SCALE {
                return Err(Error::malformed_region(format!(
                    "coordinate {} of '{}' out of range [0, {}]",
                    max, self.label, RELATIVE_SCALE
                )));
            }
        }
        Ok(())
    }

    /// Parses one region object such as `{"bbox_2d": [x1, y1, x2, y2], "label": "cup"}`.
    pub fn from_json(value: &Value, system: CoordinateSystem) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::malformed_region(format!("expect an object, got {}", value)))?;

        let geometry = match (object.get(BBOX_KEY), object.get(POINT_KEY)) {
            (Some(coords), None) => {
                let [x1, y1, x2, y2] = parse_coords::<4>(BBOX_KEY, coords)?;
                Geometry::BoundingBox(Xyxy::try_from_xyxy([x1, y1, x2, y2])?)
            }
            (None, Some(coords)) => {
                let xy = parse_coords::<2>(POINT_KEY, coords)?;
                Geometry::Point(Point::try_from_xy(xy)?)
            }
            (Some(_), Some(_)) => {
                return Err(Error::malformed_region(format!(
                    "region has both '{}' and '{}'",
                    BBOX_KEY, POINT_KEY
                )))
            }
            (None, None) => {
                return Err(Error::malformed_region(format!(
                    "region has neither '{}' nor '{}'",
                    BBOX_KEY, POINT_KEY
                )))
            }
        };

        let label = match object.get(LABEL_KEY) {
            Some(Value::String(label)) => label.clone(),
            Some(other) => {
                return Err(Error::malformed_region(format!(
                    "label must be a string, got {}",
                    other
                )))
            }
            None => return Err(Error::malformed_region("missing 'label' field")),
        };

        let attributes = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), BBOX_KEY | POINT_KEY | LABEL_KEY))
            .map(|(key, value)| match value {
                Value::String(text) => Ok((key.clone(), text.clone())),
                other => Err(Error::malformed_region(format!(
                    "attribute '{}' must be a string, got {}",
                    key, other
                ))),
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self {
            geometry,
            system,
            label,
            attributes,
        })
    }

    /// Serializes the region with the coordinate key first, then the label and attributes.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(self.geometry.key().into(), self.geometry.coords().into());
        object.insert(LABEL_KEY.into(), self.label.clone().into());
        for (key, value) in &self.attributes {
            object.insert(key.clone(), value.clone().into());
        }
        Value::Object(object)
    }

    fn with_geometry(&self, geometry: Geometry, system: CoordinateSystem) -> Self {
        Self {
            geometry,
            system,
            label: self.label.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// Computes `round(value * numer / denom)` clamped to `[0, max]`.
fn scale(value: u32, numer: u32, denom: NonZeroU32, max: u32) -> u32 {
    let raw = rounding::div_round(value as u64 * numer as u64, NonZeroU64::from(denom));
    if raw > max as u64 {
        debug!(value, raw, max, "clamping coordinate");
    }
    raw.min(max as u64) as u32
}

fn parse_coords<const N: usize>(key: &str, value: &Value) -> Result<[u32; N]> {
    let items = value
        .as_array()
        .ok_or_else(|| Error::malformed_region(format!("'{}' must be an array", key)))?;
    if items.len() != N {
        return Err(Error::malformed_region(format!(
            "'{}' expects {} values, got {}",
            key,
            N,
            items.len()
        )));
    }

    let mut coords = [0u32; N];
    for (slot, item) in coords.iter_mut().zip(items) {
        *slot = parse_coord(key, item)?;
    }
    Ok(coords)
}

fn parse_coord(key: &str, value: &Value) -> Result<u32> {
    if let Some(int) = value.as_u64() {
        return u32::try_from(int)
            .map_err(|_| Error::malformed_region(format!("'{}' value {} is too large", key, int)));
    }
    match value.as_f64() {
        Some(float) if float < 0.0 => Err(Error::malformed_region(format!(
            "'{}' coordinates must be non-negative, got {}",
            key, float
        ))),
        Some(float) if float > u32::MAX as f64 => Err(Error::malformed_region(format!(
            "'{}' value {} is too large",
            key, float
        ))),
        Some(float) => Ok(rounding::round_f64(float, u32::MAX)),
        None => Err(Error::malformed_region(format!(
            "'{}' values must be numbers, got {}",
            key, value
        ))),
    }
}
