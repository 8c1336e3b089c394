//! Entry point tying the radial pre-pass and Douglas-Peucker together.

use error_stack::Report;

use crate::accessor::{CoordinateProvider, Dimensions, DirectAccessor};
use crate::distance::Metric;
use crate::douglas_peucker::simplify_douglas_peucker;
use crate::error::SimplifyError;
use crate::radial::simplify_radial_distance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyOptions {
    /// Maximum allowed deviation, in the units of the coordinates.
    pub tolerance: f64,
    /// Skip the radial distance pre-pass. Slower, never drops a point that
    /// Douglas-Peucker alone would keep.
    pub highest_quality: bool,
    /// Return retained indices instead of the retained points.
    pub return_markers: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        SimplifyOptions { tolerance: 0.1, highest_quality: true, return_markers: false }
    }
}

impl SimplifyOptions {
    pub fn new(tolerance: f64) -> Self {
        SimplifyOptions { tolerance, ..Default::default() }
    }

    pub fn highest_quality(mut self, highest_quality: bool) -> Self {
        self.highest_quality = highest_quality;
        self
    }

    pub fn return_markers(mut self, return_markers: bool) -> Self {
        self.return_markers = return_markers;
        self
    }
}

/// Output of [`Simplifier::simplify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Simplified<'a, P> {
    Markers(Vec<usize>),
    Points(Vec<&'a P>),
}

impl<'a, P> Simplified<'a, P> {
    pub fn len(&self) -> usize {
        match self {
            Simplified::Markers(markers) => markers.len(),
            Simplified::Points(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The points of `items` at `markers`, in marker order.
///
/// Also used to carry companion records (timestamps, accuracy, ...) that
/// are kept alongside, but outside, the simplified coordinates.
///
/// # Panics
///
/// Panics if a marker is out of bounds for `items`. Markers returned by
/// [`Simplifier::markers`] for the same sequence never are.
pub fn select<'a, T>(items: &'a [T], markers: &[usize]) -> Vec<&'a T> {
    markers.iter().map(|&i| &items[i]).collect()
}

/// Polyline simplifier bound to a coordinate provider and a number of axes.
///
/// Holds no state between calls, so one instance can be shared freely.
#[derive(Debug, Clone)]
pub struct Simplifier<A = DirectAccessor> {
    accessor: A,
    dimensions: Dimensions,
}

impl Simplifier<DirectAccessor> {
    pub fn xy() -> Self {
        Simplifier::new(Dimensions::Two, DirectAccessor)
    }

    pub fn xyz() -> Self {
        Simplifier::new(Dimensions::Three, DirectAccessor)
    }
}

impl<A> Simplifier<A> {
    pub fn new(dimensions: Dimensions, accessor: A) -> Self {
        Simplifier { accessor, dimensions }
    }

    /// Ascending indices of the points kept at `options.tolerance`.
    ///
    /// Sequences of zero or one points come back unchanged.
    /// `options.return_markers` is ignored here.
    pub fn markers<P, C>(
        &self,
        points: &[P],
        options: &SimplifyOptions,
        context: &C,
    ) -> Result<Vec<usize>, Report<SimplifyError>>
    where
        A: CoordinateProvider<P, C>,
    {
        let tolerance = options.tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(Report::new(SimplifyError::InvalidTolerance(tolerance)));
        }

        let range: Vec<usize> = (0..points.len()).collect();
        if points.len() < 2 {
            return Ok(range);
        }

        let sq_tolerance = tolerance * tolerance;
        let metric = Metric::new(points, &self.accessor, context, self.dimensions);

        let range = if options.highest_quality {
            range
        } else {
            simplify_radial_distance(&metric, &range, sq_tolerance)?
        };

        let markers = simplify_douglas_peucker(&metric, &range, sq_tolerance)?;

        log::debug!(
            "simplify{}d: {} -> {} points with tolerance={}",
            self.dimensions.axes(),
            points.len(),
            markers.len(),
            tolerance
        );

        Ok(markers)
    }

    /// Simplifies `points`, returning either the retained indices or the
    /// retained points depending on `options.return_markers`.
    pub fn simplify<'a, P, C>(
        &self,
        points: &'a [P],
        options: &SimplifyOptions,
        context: &C,
    ) -> Result<Simplified<'a, P>, Report<SimplifyError>>
    where
        A: CoordinateProvider<P, C>,
    {
        let markers = self.markers(points, options, context)?;

        if options.return_markers {
            Ok(Simplified::Markers(markers))
        } else {
            Ok(Simplified::Points(select(points, &markers)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Coordinates, FeatureAccessor, FieldAccessor, FieldNames};
    use geojson::{Feature, Geometry, Value};
    use serde_json::json;

    fn markers_of(points: &[[f64; 2]], options: SimplifyOptions) -> Vec<usize> {
        Simplifier::xy().markers(points, &options, &()).unwrap()
    }

    fn wiggly_track() -> Vec<[f64; 3]> {
        (0..120)
            .map(|i| {
                let t = i as f64 * 0.1;
                [t, (t * 1.7).sin() * 2.0 + (t * 5.3).cos() * 0.3, (t * 0.9).cos()]
            })
            .collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let points = [[0.0, 0.0], [1.0, 0.05], [2.0, -0.05], [3.0, 0.0], [4.0, 10.0]];
        assert_eq!(markers_of(&points, SimplifyOptions::new(0.5)), vec![0, 3, 4]);
    }

    #[test]
    fn test_returns_points_by_default() {
        let points = vec![[0.0, 0.0], [1.0, 0.05], [2.0, -0.05], [3.0, 0.0], [4.0, 10.0]];
        let result = Simplifier::xy().simplify(&points, &SimplifyOptions::new(0.5), &()).unwrap();
        assert_eq!(result, Simplified::Points(vec![&points[0], &points[3], &points[4]]));
    }

    #[test]
    fn test_return_markers() {
        let points = vec![[0.0, 0.0], [1.0, 0.05], [2.0, -0.05], [3.0, 0.0], [4.0, 10.0]];
        let options = SimplifyOptions::new(0.5).return_markers(true);
        let result = Simplifier::xy().simplify(&points, &options, &()).unwrap();
        assert_eq!(result, Simplified::Markers(vec![0, 3, 4]));
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty: Vec<[f64; 2]> = Vec::new();
        assert_eq!(markers_of(&empty, SimplifyOptions::default()), Vec::<usize>::new());
        assert_eq!(markers_of(&[[1.0, 2.0]], SimplifyOptions::default()), vec![0]);

        let result = Simplifier::xy().simplify(&empty, &SimplifyOptions::default(), &()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let err = Simplifier::xy().markers(&points[..], &SimplifyOptions::new(-1.0), &()).unwrap_err();
        assert_eq!(err.current_context(), &SimplifyError::InvalidTolerance(-1.0));

        let err = Simplifier::xy().markers(&points[..], &SimplifyOptions::new(f64::NAN), &()).unwrap_err();
        assert!(matches!(err.current_context(), SimplifyError::InvalidTolerance(_)));
    }

    #[test]
    fn test_endpoints_always_kept() {
        let track = wiggly_track();
        for tolerance in [0.0, 0.01, 0.5, 3.0, 1e9] {
            for highest_quality in [true, false] {
                let options = SimplifyOptions::new(tolerance).highest_quality(highest_quality);
                let markers = Simplifier::xyz().markers(&track, &options, &()).unwrap();
                assert_eq!(markers[0], 0);
                assert_eq!(*markers.last().unwrap(), track.len() - 1);
            }
        }
    }

    #[test]
    fn test_markers_strictly_ascending() {
        let track = wiggly_track();
        let options = SimplifyOptions::new(0.05).highest_quality(false);
        let markers = Simplifier::xyz().markers(&track, &options, &()).unwrap();
        assert!(markers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_monotonic_reduction() {
        let track = wiggly_track();
        let mut previous = usize::MAX;
        for tolerance in [0.0, 0.001, 0.01, 0.05, 0.1, 0.3, 0.8, 2.0, 10.0] {
            let count = Simplifier::xyz()
                .markers(&track, &SimplifyOptions::new(tolerance), &())
                .unwrap()
                .len();
            assert!(count <= previous, "{} > {} at tolerance {}", count, previous, tolerance);
            previous = count;
        }
    }

    #[test]
    fn test_huge_tolerance_keeps_endpoints_only() {
        let track = wiggly_track();
        let markers = Simplifier::xyz().markers(&track, &SimplifyOptions::new(1e6), &()).unwrap();
        assert_eq!(markers, vec![0, track.len() - 1]);
    }

    #[test]
    fn test_resimplifying_removes_nothing() {
        let track = wiggly_track();
        let options = SimplifyOptions::new(0.2);
        let first: Vec<[f64; 3]> = Simplifier::xyz()
            .markers(&track, &options, &())
            .unwrap()
            .into_iter()
            .map(|i| track[i])
            .collect();
        let second = Simplifier::xyz().markers(&first, &options, &()).unwrap();
        assert_eq!(second, (0..first.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_dimensionality_consistency() {
        let planar: Vec<[f64; 2]> = wiggly_track().iter().map(|p| [p[0], p[1]]).collect();
        let flat: Vec<[f64; 3]> = planar.iter().map(|p| [p[0], p[1], 0.0]).collect();
        for tolerance in [0.0, 0.05, 0.4] {
            for highest_quality in [true, false] {
                let options = SimplifyOptions::new(tolerance).highest_quality(highest_quality);
                assert_eq!(
                    Simplifier::xy().markers(&planar, &options, &()).unwrap(),
                    Simplifier::xyz().markers(&flat, &options, &()).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_fast_mode_discards_greedily() {
        // point 2 sits within tolerance of point 1, so the radial pass drops
        // it before Douglas-Peucker can see its deviation from the chord
        let points = [[0.0, 0.0], [5.0, 0.3], [5.1, 0.6], [10.0, 0.0]];
        let quality = markers_of(&points, SimplifyOptions::new(0.45));
        let fast = markers_of(&points, SimplifyOptions::new(0.45).highest_quality(false));
        assert_eq!(quality, vec![0, 2, 3]);
        assert_eq!(fast, vec![0, 3]);
    }

    #[test]
    fn test_three_d_requires_three_coordinates() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.0]];
        let err = Simplifier::xyz().markers(&points, &SimplifyOptions::default(), &()).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SimplifyError::MissingCoordinates { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_feature_accessor() {
        let features: Vec<Feature> = [[0.0, 0.0, 0.0], [1.0, 2.5, 0.0], [2.0, 5.0, 0.0], [3.0, 0.0, 0.0]]
            .iter()
            .map(|p| Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(p.to_vec()))),
                id: None,
                properties: None,
                foreign_members: None,
            })
            .collect();
        let simplifier = Simplifier::new(Dimensions::Three, FeatureAccessor);
        let markers = simplifier.markers(&features, &SimplifyOptions::new(0.5), &()).unwrap();
        assert_eq!(markers, vec![0, 2, 3]);
    }

    #[test]
    fn test_context_reaches_accessor() {
        let records: Vec<_> = [
            json!({"lon": 0.0, "lat": 0.0, "alt": 0.0, "baro": 0.0}),
            json!({"lon": 1.0, "lat": 0.0, "alt": 0.0, "baro": 9.0}),
            json!({"lon": 2.0, "lat": 0.0, "alt": 0.0, "baro": 0.0}),
        ]
        .iter()
        .map(|r| r.as_object().unwrap().clone())
        .collect();

        let simplifier = Simplifier::new(Dimensions::Three, FieldAccessor);
        let options = SimplifyOptions::new(1.0);

        let gps = FieldNames::new("lon", "lat").with_z("alt");
        assert_eq!(simplifier.markers(&records, &options, &gps).unwrap(), vec![0, 2]);

        let baro = FieldNames::new("lon", "lat").with_z("baro");
        assert_eq!(simplifier.markers(&records, &options, &baro).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_closure_accessor_with_payload() {
        struct Fix {
            x: f64,
            y: f64,
            _label: &'static str,
        }
        let fixes = vec![
            Fix { x: 0.0, y: 0.0, _label: "start" },
            Fix { x: 1.0, y: 0.0, _label: "mid" },
            Fix { x: 2.0, y: 0.0, _label: "end" },
        ];
        let simplifier = Simplifier::new(Dimensions::Two, |f: &[Fix], i: usize, _: &()| {
            Coordinates::xy(f[i].x, f[i].y)
        });
        let result = simplifier.simplify(&fixes, &SimplifyOptions::new(0.0), &()).unwrap();
        match result {
            Simplified::Points(kept) => {
                assert_eq!(kept.len(), 2);
                assert_eq!(kept[1]._label, "end");
            }
            Simplified::Markers(_) => panic!("expected points"),
        }
    }

    #[test]
    fn test_select_rekeys_records() {
        let times = vec!["t0", "t1", "t2", "t3", "t4"];
        assert_eq!(select(&times, &[0, 3, 4]), vec![&"t0", &"t3", &"t4"]);
    }

    #[test]
    #[should_panic]
    fn test_select_out_of_bounds_marker() {
        let times = vec!["t0", "t1"];
        select(&times, &[0, 2]);
    }
}
