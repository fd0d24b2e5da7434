use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Geometry errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("image dimensions must be positive, got width={width} height={height}")]
    InvalidDimension { width: i64, height: i64 },
    #[error("invalid box: {0}")]
    InvalidBox(String),
    #[error("absolute aspect ratio must be smaller than {max}, got {ratio}")]
    AspectRatio { ratio: f64, max: f64 },
}
