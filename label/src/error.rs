use bbox::CoordinateSystem;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while reading, validating or converting annotations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("image dimensions must be positive, got width={width} height={height}")]
    InvalidDimension { width: i64, height: i64 },
    #[error("malformed region: {0}")]
    MalformedRegion(String),
    #[error("record mixes {first} and {second} regions")]
    InconsistentCoordinateSystem {
        first: CoordinateSystem,
        second: CoordinateSystem,
    },
    #[error("malformed sample: {0}")]
    MalformedSample(String),
    #[error(transparent)]
    Geometry(bbox::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed_region(msg: impl Into<String>) -> Self {
        Self::MalformedRegion(msg.into())
    }

    pub(crate) fn malformed_sample(msg: impl Into<String>) -> Self {
        Self::MalformedSample(msg.into())
    }
}

impl From<bbox::Error> for Error {
    fn from(err: bbox::Error) -> Self {
        match err {
            bbox::Error::InvalidDimension { width, height } => {
                Self::InvalidDimension { width, height }
            }
            bbox::Error::InvalidBox(msg) => Self::MalformedRegion(msg),
            err => Self::Geometry(err),
        }
    }
}
