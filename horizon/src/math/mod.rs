//! Spherical geometry helpers.

mod elevation_angle;
mod enu;
mod great_circle;

pub use self::{
    elevation_angle::{curvature_drop, elevation_angle},
    enu::{check_geodetic, normalize_lon, Enu, Frame, Geodetic},
};
pub(crate) use self::great_circle::{sample_count, RayIter};
