use error_stack::Report;

use crate::accessor::CoordinateProvider;
use crate::distance::Metric;
use crate::error::SimplifyError;

/// Drops every point of `range` that lies within `sqrt(sq_tolerance)` of the
/// most recently kept one.
///
/// `range` is an ascending list of indices into the metric's points. The
/// first and last entries are always kept; ranges shorter than two are
/// returned unchanged.
pub fn simplify_radial_distance<P, A, C>(
    metric: &Metric<'_, P, A, C>,
    range: &[usize],
    sq_tolerance: f64,
) -> Result<Vec<usize>, Report<SimplifyError>>
where
    A: CoordinateProvider<P, C>,
{
    let (first, last) = match (range.first(), range.last()) {
        (Some(&first), Some(&last)) if range.len() > 1 => (first, last),
        _ => return Ok(range.to_vec()),
    };

    let mut prev = first;
    let mut markers = vec![first];

    for &i in &range[1..] {
        if metric.square_distance(i, prev)? > sq_tolerance {
            markers.push(i);
            prev = i;
        }
    }

    if prev != last {
        markers.push(last);
    }

    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{Dimensions, DirectAccessor};

    fn run(points: &[[f64; 2]], tolerance: f64) -> Vec<usize> {
        let metric = Metric::new(points, &DirectAccessor, &(), Dimensions::Two);
        let range: Vec<usize> = (0..points.len()).collect();
        simplify_radial_distance(&metric, &range, tolerance * tolerance).unwrap()
    }

    #[test]
    fn test_drops_clustered_points() {
        let points = [[0.0, 0.0], [0.1, 0.0], [0.2, 0.0], [1.0, 0.0], [1.05, 0.0], [2.0, 0.0]];
        assert_eq!(run(&points, 0.5), vec![0, 3, 5]);
    }

    #[test]
    fn test_forces_last_point() {
        let points = [[0.0, 0.0], [5.0, 0.0], [5.1, 0.0]];
        assert_eq!(run(&points, 1.0), vec![0, 1, 2]);
    }

    #[test]
    fn test_last_point_not_duplicated() {
        let points = [[0.0, 0.0], [0.1, 0.0], [5.0, 0.0]];
        assert_eq!(run(&points, 1.0), vec![0, 2]);
    }

    #[test]
    fn test_zero_tolerance_keeps_distinct_points() {
        let points = [[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        assert_eq!(run(&points, 0.0), vec![0, 2, 4]);
    }

    #[test]
    fn test_short_ranges_unchanged() {
        let points = [[0.0, 0.0], [1.0, 1.0]];
        let metric = Metric::new(&points[..], &DirectAccessor, &(), Dimensions::Two);
        assert_eq!(simplify_radial_distance(&metric, &[], 1.0).unwrap(), Vec::<usize>::new());
        assert_eq!(simplify_radial_distance(&metric, &[1], 1.0).unwrap(), vec![1]);
    }

    #[test]
    fn test_walks_only_given_range() {
        let points = [[0.0, 0.0], [9.0, 9.0], [0.2, 0.0], [3.0, 0.0]];
        let metric = Metric::new(&points[..], &DirectAccessor, &(), Dimensions::Two);
        let markers = simplify_radial_distance(&metric, &[0, 2, 3], 1.0).unwrap();
        assert_eq!(markers, vec![0, 3]);
    }
}
