use std::error::Error;
use std::fmt;

/// Failures raised by the simplification engine.
///
/// All of these are caller errors: a bad tolerance, or a coordinate
/// provider that does not agree with the configured dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub enum SimplifyError {
    InvalidTolerance(f64),
    MissingCoordinates { index: usize, expected: usize, found: usize },
    NonFiniteCoordinate { index: usize },
}

impl fmt::Display for SimplifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplifyError::InvalidTolerance(tolerance) => {
                write!(f, "tolerance must be a non-negative number, got {}", tolerance)
            }
            SimplifyError::MissingCoordinates { index, expected, found } => write!(
                f,
                "point {} has {} coordinates, expected at least {}",
                index, found, expected
            ),
            SimplifyError::NonFiniteCoordinate { index } => {
                write!(f, "point {} has a non-finite coordinate", index)
            }
        }
    }
}

impl Error for SimplifyError {}

/// Failures raised while loading, simplifying or writing track files.
#[derive(Debug)]
pub enum TrackError {
    Read,
    Parse,
    UnsupportedGeoJson(String),
    Write,
    Simplify,
    ThreadPool,
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Read => write!(f, "failed to read track file"),
            TrackError::Parse => write!(f, "failed to parse track file"),
            TrackError::UnsupportedGeoJson(kind) => {
                write!(f, "unsupported GeoJSON content: {}", kind)
            }
            TrackError::Write => write!(f, "failed to write output file"),
            TrackError::Simplify => write!(f, "failed to simplify track"),
            TrackError::ThreadPool => write!(f, "failed to configure the worker pool"),
        }
    }
}

impl Error for TrackError {}
