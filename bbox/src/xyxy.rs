use crate::{common::*, Transform};

/// Axis-aligned bounding box in `[x1, y1, x2, y2]` format.
///
/// `(x1, y1)` is the top-left corner and `(x2, y2)` the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xyxy<T> {
    pub(crate) x1: T,
    pub(crate) y1: T,
    pub(crate) x2: T,
    pub(crate) y2: T,
}

impl<T> Xyxy<T> {
    /// Applies `f` to every coordinate without checking the corner order.
    ///
    /// Rounding can collapse a box, so callers re-check with [Xyxy::is_valid].
    pub fn map<V, F>(self, mut f: F) -> Xyxy<V>
    where
        F: FnMut(T) -> V,
    {
        Xyxy {
            x1: f(self.x1),
            y1: f(self.y1),
            x2: f(self.x2),
            y2: f(self.y2),
        }
    }

    /// Applies `fx` to the x coordinates and `fy` to the y coordinates.
    pub fn map_xy<V, FX, FY>(self, mut fx: FX, mut fy: FY) -> Xyxy<V>
    where
        FX: FnMut(T) -> V,
        FY: FnMut(T) -> V,
    {
        Xyxy {
            x1: fx(self.x1),
            y1: fy(self.y1),
            x2: fx(self.x2),
            y2: fy(self.y2),
        }
    }
}

impl<T> Xyxy<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_xyxy(xyxy: [T; 4]) -> Result<Self> {
        let [x1, y1, x2, y2] = xyxy;
        let zero = T::zero();
        if !(x1 >= zero && y1 >= zero) {
            return Err(Error::InvalidBox("coordinates must be non-negative".into()));
        }
        if !(x1 < x2 && y1 < y2) {
            return Err(Error::InvalidBox("x1 < x2 and y1 < y2 must hold".into()));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn x1(&self) -> T {
        self.x1
    }

    pub fn y1(&self) -> T {
        self.y1
    }

    pub fn x2(&self) -> T {
        self.x2
    }

    pub fn y2(&self) -> T {
        self.y2
    }

    pub fn w(&self) -> T {
        self.x2 - self.x1
    }

    pub fn h(&self) -> T {
        self.y2 - self.y1
    }

    pub fn xyxy(&self) -> [T; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Checks that the corners are strictly ordered and non-negative.
    pub fn is_valid(&self) -> bool {
        let zero = T::zero();
        self.x1 >= zero && self.y1 >= zero && self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        Xyxy {
            x1: self.x1 * transform.sx + transform.tx,
            y1: self.y1 * transform.sy + transform.ty,
            x2: self.x2 * transform.sx + transform.tx,
            y2: self.y2 * transform.sy + transform.ty,
        }
    }
}

impl<T> Mul<&Xyxy<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = Xyxy<T>;

    fn mul(self, rhs: &Xyxy<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> fmt::Display for Xyxy<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}
