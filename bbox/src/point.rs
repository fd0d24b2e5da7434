use crate::{common::*, Transform};

/// A single `[x, y]` location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<T> {
    pub(crate) x: T,
    pub(crate) y: T,
}

impl<T> Point<T> {
    pub fn map_xy<V, FX, FY>(self, fx: FX, fy: FY) -> Point<V>
    where
        FX: FnOnce(T) -> V,
        FY: FnOnce(T) -> V,
    {
        Point {
            x: fx(self.x),
            y: fy(self.y),
        }
    }
}

impl<T> Point<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_xy(xy: [T; 2]) -> Result<Self> {
        let [x, y] = xy;
        let zero = T::zero();
        if !(x >= zero && y >= zero) {
            return Err(Error::InvalidBox(
                "point coordinates must be non-negative".into(),
            ));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> T {
        self.x
    }

    pub fn y(&self) -> T {
        self.y
    }

    pub fn xy(&self) -> [T; 2] {
        [self.x, self.y]
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        Point {
            x: self.x * transform.sx + transform.tx,
            y: self.y * transform.sy + transform.ty,
        }
    }
}

impl<T> Mul<&Point<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = Point<T>;

    fn mul(self, rhs: &Point<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> fmt::Display for Point<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}
