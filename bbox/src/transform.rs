use crate::{common::*, ImageSize, Xyxy};

/// A per-axis scale followed by a translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The transform mapping `src` onto `tgt`.
    pub fn from_rects(src: &Xyxy<T>, tgt: &Xyxy<T>) -> Self {
        let sy = tgt.h() / src.h();
        let sx = tgt.w() / src.w();
        let ty = tgt.y1() - src.y1() * sy;
        let tx = tgt.x1() - src.x1() * sx;

        Self { sy, sx, ty, tx }
    }
}

impl Transform<f64> {
    /// The transform for stretching an image of `src` size to exactly `tgt` size.
    pub fn from_sizes_exact(src: ImageSize, tgt: ImageSize) -> Self {
        let full = |size: ImageSize| Xyxy {
            x1: 0.0,
            y1: 0.0,
            x2: size.w() as f64,
            y2: size.h() as f64,
        };
        Self::from_rects(&full(src), &full(tgt))
    }
}
