//! Evenly spaced samples along a great circle leaving a [Frame]'s
//! origin.

use super::Frame;
use geo::geometry::Coord;

/// Yields `(distance_m, coord)` for each sample along a ray, from
/// `first_m` out to (at most) `last_m`, every `step_m`.
///
/// Distances are computed as `first_m + n * step_m` rather than by
/// accumulation, so a given sample index always lands on the same
/// coordinate.
pub struct RayIter<'a> {
    frame: &'a Frame,
    sin_az: f64,
    cos_az: f64,
    first_m: f64,
    step_m: f64,
    total_points: usize,
    current_point: usize,
}

impl<'a> RayIter<'a> {
    pub fn new(frame: &'a Frame, azimuth_rad: f64, first_m: f64, step_m: f64, last_m: f64) -> Self {
        let (sin_az, cos_az) = azimuth_rad.sin_cos();
        Self {
            frame,
            sin_az,
            cos_az,
            first_m,
            step_m,
            total_points: sample_count(first_m, step_m, last_m),
            current_point: 0,
        }
    }
}

/// Number of samples in `first_m, first_m + step_m, ..` not beyond
/// `last_m`, saturating at `usize::MAX`.
pub fn sample_count(first_m: f64, step_m: f64, last_m: f64) -> usize {
    if !(step_m > 0.0 && first_m <= last_m) {
        return 0;
    }
    // Absorb rounding error when `last_m` is an exact multiple.
    let steps = ((last_m - first_m) / step_m + 1e-9).floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = steps as usize;
    steps.saturating_add(1)
}

impl<'a> Iterator for RayIter<'a> {
    type Item = (f64, Coord<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_point < self.total_points {
            #[allow(clippy::cast_precision_loss)]
            let distance_m = self.first_m + self.current_point as f64 * self.step_m;
            self.current_point += 1;
            let coord = self
                .frame
                .destination_with(self.sin_az, self.cos_az, distance_m);
            Some((distance_m, coord))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_points - self.current_point;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for RayIter<'a> {}
