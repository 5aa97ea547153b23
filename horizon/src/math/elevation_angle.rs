use num_traits::Float;

/// Returns how far a point `distance_m` away (along the surface)
/// sits below the observer's tangent plane.
pub fn curvature_drop<T: Float>(distance_m: T, body_radius: T) -> T {
    distance_m.powi(2) / ((T::one() + T::one()) * body_radius)
}

/// Returns the apparent up/down angle (in radians) from an observer
/// at `start_elev_m` to terrain `distance_m` away at `end_elev_m`.
///
/// The terrain is lowered by [curvature_drop] and the angle is then
/// taken in the observer's tangent plane.
pub fn elevation_angle<T: Float>(start_elev_m: T, distance_m: T, end_elev_m: T, body_radius: T) -> T {
    let rise = end_elev_m - start_elev_m - curvature_drop(distance_m, body_radius);
    rise.atan2(distance_m)
}
