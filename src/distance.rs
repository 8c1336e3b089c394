use error_stack::Report;

use crate::accessor::{CoordinateProvider, Dimensions};
use crate::error::SimplifyError;

/// Squared distance between two points (x, y).
pub fn square_distance_2d(p1: [f64; 2], p2: [f64; 2]) -> f64 {
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    dx * dx + dy * dy
}

/// Squared distance between two points (x, y, z).
pub fn square_distance_3d(p1: [f64; 3], p2: [f64; 3]) -> f64 {
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    let dz = p1[2] - p2[2];
    dx * dx + dy * dy + dz * dz
}

/// Squared distance from `p` to the segment `[a, b]`.
///
/// The projection parameter is clamped to `a` when `t <= 0` and to `b`
/// when `t > 1`. A degenerate segment measures from `a`.
pub fn square_segment_distance_2d(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (mut x, mut y) = (a[0], a[1]);
    let dx = b[0] - x;
    let dy = b[1] - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p[0] - x) * dx + (p[1] - y) * dy) / (dx * dx + dy * dy);

        if t > 1.0 {
            x = b[0];
            y = b[1];
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    square_distance_2d(p, [x, y])
}

/// Squared distance from `p` to the segment `[a, b]` in three dimensions.
pub fn square_segment_distance_3d(p: [f64; 3], a: [f64; 3], b: [f64; 3]) -> f64 {
    let (mut x, mut y, mut z) = (a[0], a[1], a[2]);
    let dx = b[0] - x;
    let dy = b[1] - y;
    let dz = b[2] - z;

    if dx != 0.0 || dy != 0.0 || dz != 0.0 {
        let t = ((p[0] - x) * dx + (p[1] - y) * dy + (p[2] - z) * dz)
            / (dx * dx + dy * dy + dz * dz);

        if t > 1.0 {
            x = b[0];
            y = b[1];
            z = b[2];
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
            z += dz * t;
        }
    }

    square_distance_3d(p, [x, y, z])
}

/// Index based distance metrics over a point sequence.
///
/// Coordinates are fetched through the provider on every call, with the
/// caller's context passed along unchanged.
pub struct Metric<'a, P, A, C> {
    points: &'a [P],
    accessor: &'a A,
    context: &'a C,
    dimensions: Dimensions,
}

impl<'a, P, A, C> Metric<'a, P, A, C>
where
    A: CoordinateProvider<P, C>,
{
    pub fn new(points: &'a [P], accessor: &'a A, context: &'a C, dimensions: Dimensions) -> Self {
        Metric { points, accessor, context, dimensions }
    }

    /// Coordinates of `points[index]`, zero padded to three axes once the
    /// configured number of axes has been checked.
    pub fn fetch(&self, index: usize) -> Result<[f64; 3], Report<SimplifyError>> {
        let coords = self.accessor.coordinates(self.points, index, self.context);
        let expected = self.dimensions.axes();

        if coords.len() < expected {
            return Err(Report::new(SimplifyError::MissingCoordinates {
                index,
                expected,
                found: coords.len(),
            }));
        }

        let values = &coords.as_slice()[..expected];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Report::new(SimplifyError::NonFiniteCoordinate { index })
                .attach_printable(format!("coordinates: {:?}", values)));
        }

        let mut out = [0.0; 3];
        out[..expected].copy_from_slice(values);
        Ok(out)
    }

    pub fn square_distance(&self, i: usize, j: usize) -> Result<f64, Report<SimplifyError>> {
        let p1 = self.fetch(i)?;
        let p2 = self.fetch(j)?;
        Ok(match self.dimensions {
            Dimensions::Two => square_distance_2d([p1[0], p1[1]], [p2[0], p2[1]]),
            Dimensions::Three => square_distance_3d(p1, p2),
        })
    }

    pub fn square_segment_distance(
        &self,
        p: usize,
        a: usize,
        b: usize,
    ) -> Result<f64, Report<SimplifyError>> {
        let pp = self.fetch(p)?;
        let pa = self.fetch(a)?;
        let pb = self.fetch(b)?;
        Ok(match self.dimensions {
            Dimensions::Two => square_segment_distance_2d(
                [pp[0], pp[1]],
                [pa[0], pa[1]],
                [pb[0], pb[1]],
            ),
            Dimensions::Three => square_segment_distance_3d(pp, pa, pb),
        })
    }
}
