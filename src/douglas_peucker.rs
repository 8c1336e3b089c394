use error_stack::Report;

use crate::accessor::CoordinateProvider;
use crate::distance::Metric;
use crate::error::SimplifyError;

/// Douglas-Peucker refinement of `range`, an ascending list of indices into
/// the metric's points.
///
/// Runs over an explicit stack of pending `(first, last)` position pairs
/// instead of recursing, so long tracks cannot exhaust the call stack. The
/// most recently pushed pair is processed first, which gives the same
/// depth-first order as the recursive formulation. Returns the retained
/// indices in ascending order.
pub fn simplify_douglas_peucker<P, A, C>(
    metric: &Metric<'_, P, A, C>,
    range: &[usize],
    sq_tolerance: f64,
) -> Result<Vec<usize>, Report<SimplifyError>>
where
    A: CoordinateProvider<P, C>,
{
    if range.len() < 2 {
        return Ok(range.to_vec());
    }

    let end = range.len() - 1;
    let mut markers = vec![range[0], range[end]];
    let mut pending: Vec<(usize, usize)> = Vec::new();
    let mut peak_depth = 0;
    let mut current = Some((0, end));

    while let Some((first, last)) = current {
        let mut max_sq_dist = 0.0;
        let mut index = first;

        for k in first + 1..last {
            let sq_dist = metric.square_segment_distance(range[k], range[first], range[last])?;

            if sq_dist > max_sq_dist {
                index = k;
                max_sq_dist = sq_dist;
            }
        }

        if max_sq_dist > sq_tolerance {
            markers.push(range[index]);

            pending.push((first, index));
            pending.push((index, last));
            peak_depth = peak_depth.max(pending.len());
        }

        current = pending.pop();
    }

    log::trace!(
        "douglas-peucker: kept {} of {} points, peak pending ranges {}",
        markers.len(),
        range.len(),
        peak_depth
    );

    markers.sort_unstable();
    Ok(markers)
}
