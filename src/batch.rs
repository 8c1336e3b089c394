use error_stack::Report;
use rayon::prelude::*;

use crate::accessor::CoordinateProvider;
use crate::error::SimplifyError;
use crate::simplify::{Simplifier, SimplifyOptions};

/// Marker sets for many independent tracks, computed on the rayon pool.
///
/// Results come back in input order; a failure on one track does not stop
/// the others.
pub fn markers_par<P, A, C>(
    simplifier: &Simplifier<A>,
    tracks: &[Vec<P>],
    options: &SimplifyOptions,
    context: &C,
) -> Vec<Result<Vec<usize>, Report<SimplifyError>>>
where
    P: Sync,
    A: CoordinateProvider<P, C> + Sync,
    C: Sync,
{
    tracks
        .par_iter()
        .map(|track| simplifier.markers(track.as_slice(), options, context))
        .collect()
}
