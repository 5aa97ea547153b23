//! Spherical geodetic <-> local East-North-Up conversions.

use crate::HorizonError;
use geo::geometry::Coord;

/// A point on or above a spherical body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Height above the reference sphere, meters.
    pub alt_m: f64,
}

impl Geodetic {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    /// Returns the (lon, lat) part of this point.
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon_deg,
            y: self.lat_deg,
        }
    }
}

/// Offsets, in meters, from a [Frame]'s origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    /// Distance from the origin's vertical axis.
    pub fn horizontal(&self) -> f64 {
        self.east.hypot(self.north)
    }

    /// Angle above the origin's local horizontal, in radians.
    pub fn elevation_angle(&self) -> f64 {
        self.up.atan2(self.horizontal())
    }
}

/// Returns an error unless `lat` is in [-90, 90] and `lon` in
/// [-180, 180].
pub fn check_geodetic(lat_deg: f64, lon_deg: f64) -> Result<(), HorizonError> {
    if (-90.0..=90.0).contains(&lat_deg) && (-180.0..=180.0).contains(&lon_deg) {
        Ok(())
    } else {
        Err(HorizonError::OutOfRange {
            lat: lat_deg,
            lon: lon_deg,
        })
    }
}

/// Wraps a longitude into [-180, 180).
pub fn normalize_lon(lon_deg: f64) -> f64 {
    (lon_deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Tangent-plane frame anchored at a point on a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    origin: Geodetic,
    radius_m: f64,
    sin_lat: f64,
    cos_lat: f64,
    sin_lon: f64,
    cos_lon: f64,
    origin_ecef: [f64; 3],
}

impl Frame {
    pub fn new(origin: Geodetic, radius_m: f64) -> Result<Self, HorizonError> {
        check_geodetic(origin.lat_deg, origin.lon_deg)?;
        let (sin_lat, cos_lat) = origin.lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = origin.lon_deg.to_radians().sin_cos();
        Ok(Self {
            origin,
            radius_m,
            sin_lat,
            cos_lat,
            sin_lon,
            cos_lon,
            origin_ecef: ecef(&origin, radius_m),
        })
    }

    pub fn origin(&self) -> Geodetic {
        self.origin
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Returns `point` expressed in this frame.
    pub fn to_enu(&self, point: Geodetic) -> Result<Enu, HorizonError> {
        check_geodetic(point.lat_deg, point.lon_deg)?;
        Ok(self.project(point))
    }

    /// Returns the geodetic position of `enu`.
    pub fn to_geodetic(&self, enu: Enu) -> Geodetic {
        let [ox, oy, oz] = self.origin_ecef;
        let Enu { east, north, up } = enu;
        let x = ox - self.sin_lon * east - self.sin_lat * self.cos_lon * north
            + self.cos_lat * self.cos_lon * up;
        let y = oy + self.cos_lon * east - self.sin_lat * self.sin_lon * north
            + self.cos_lat * self.sin_lon * up;
        let z = oz + self.cos_lat * north + self.sin_lat * up;

        let r = (x * x + y * y + z * z).sqrt();
        Geodetic {
            lat_deg: (z / r).asin().to_degrees(),
            lon_deg: normalize_lon(y.atan2(x).to_degrees()),
            alt_m: r - self.radius_m,
        }
    }

    /// Returns the surface position `distance_m` along the great
    /// circle leaving the origin at `azimuth_rad` (0 = north,
    /// clockwise).
    pub fn destination(&self, azimuth_rad: f64, distance_m: f64) -> Coord<f64> {
        let (sin_az, cos_az) = azimuth_rad.sin_cos();
        self.destination_with(sin_az, cos_az, distance_m)
    }

    /// [Frame::to_enu] without validating `point`.
    pub(crate) fn project(&self, point: Geodetic) -> Enu {
        let [px, py, pz] = ecef(&point, self.radius_m);
        let [ox, oy, oz] = self.origin_ecef;
        let (dx, dy, dz) = (px - ox, py - oy, pz - oz);

        let east = -self.sin_lon * dx + self.cos_lon * dy;
        let north = -self.sin_lat * self.cos_lon * dx - self.sin_lat * self.sin_lon * dy
            + self.cos_lat * dz;
        let up = self.cos_lat * self.cos_lon * dx
            + self.cos_lat * self.sin_lon * dy
            + self.sin_lat * dz;
        Enu { east, north, up }
    }

    pub(crate) fn destination_with(&self, sin_az: f64, cos_az: f64, distance_m: f64) -> Coord<f64> {
        let (sin_d, cos_d) = (distance_m / self.radius_m).sin_cos();
        let sin_lat2 = (self.sin_lat * cos_d + self.cos_lat * sin_d * cos_az).clamp(-1.0, 1.0);
        let lat2 = sin_lat2.asin();
        let dlon = (sin_az * sin_d * self.cos_lat).atan2(cos_d - self.sin_lat * sin_lat2);
        Coord {
            x: normalize_lon(self.origin.lon_deg + dlon.to_degrees()),
            y: lat2.to_degrees(),
        }
    }
}

fn ecef(point: &Geodetic, radius_m: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = point.lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = point.lon_deg.to_radians().sin_cos();
    let r = radius_m + point.alt_m;
    [r * cos_lat * cos_lon, r * cos_lat * sin_lon, r * sin_lat]
}

#[cfg(test)]
mod tests {
    use super::{check_geodetic, normalize_lon, Enu, Frame, Geodetic};
    use crate::{Body, HorizonError};
    use approx::assert_abs_diff_eq;

    fn boulder() -> Frame {
        Frame::new(Geodetic::new(40.0, -105.0, 1650.0), Body::Earth.radius_m()).unwrap()
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            check_geodetic(90.5, 0.0),
            Err(HorizonError::OutOfRange { .. })
        ));
        assert!(matches!(
            check_geodetic(0.0, -180.1),
            Err(HorizonError::OutOfRange { .. })
        ));
        assert!(check_geodetic(f64::NAN, 0.0).is_err());
        assert!(check_geodetic(-90.0, 180.0).is_ok());
        assert!(Frame::new(Geodetic::new(100.0, 0.0, 0.0), 1.0).is_err());
        assert!(boulder().to_enu(Geodetic::new(0.0, 181.0, 0.0)).is_err());
    }

    #[test]
    fn test_origin_is_zero() {
        let frame = boulder();
        let enu = frame.to_enu(frame.origin()).unwrap();
        assert_abs_diff_eq!(enu.east, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(enu.north, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(enu.up, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_axes() {
        let frame = boulder();
        // A point straight above the origin.
        let above = frame.to_enu(Geodetic::new(40.0, -105.0, 1750.0)).unwrap();
        assert_abs_diff_eq!(above.up, 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(above.horizontal(), 0.0, epsilon = 1e-6);

        // North of the origin.
        let north = frame.to_enu(Geodetic::new(40.01, -105.0, 1650.0)).unwrap();
        assert!(north.north > 1000.0);
        assert_abs_diff_eq!(north.east, 0.0, epsilon = 1e-6);
        assert!(north.up < 0.0);

        // East of the origin.
        let east = frame.to_enu(Geodetic::new(40.0, -104.99, 1650.0)).unwrap();
        assert!(east.east > 800.0);
    }

    #[test]
    fn test_roundtrip() {
        let frame = boulder();
        let enu = Enu {
            east: -12_345.0,
            north: 6_789.0,
            up: 250.0,
        };
        let geodetic = frame.to_geodetic(enu);
        let back = frame.to_enu(geodetic).unwrap();
        assert_abs_diff_eq!(back.east, enu.east, epsilon = 1e-6);
        assert_abs_diff_eq!(back.north, enu.north, epsilon = 1e-6);
        assert_abs_diff_eq!(back.up, enu.up, epsilon = 1e-6);
    }

    #[test]
    fn test_destination_matches_enu_bearing() {
        let frame = boulder();
        let radius = Body::Earth.radius_m();
        for azimuth_deg in [0.0_f64, 45.0, 90.0, 200.0, 315.0] {
            let distance = 10_000.0;
            let dest = frame.destination(azimuth_deg.to_radians(), distance);
            let enu = frame
                .to_enu(Geodetic::new(dest.y, dest.x, frame.origin().alt_m))
                .unwrap();
            let bearing = enu.east.atan2(enu.north).to_degrees();
            let error = (bearing - azimuth_deg + 180.0).rem_euclid(360.0) - 180.0;
            assert_abs_diff_eq!(error, 0.0, epsilon = 1e-6);
            // Chord of a 10 km arc.
            let chord = 2.0 * (radius + 1650.0) * (distance / (2.0 * radius)).sin();
            let slant = (enu.horizontal().powi(2) + enu.up.powi(2)).sqrt();
            assert_abs_diff_eq!(slant, chord, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_destination_wraps_antimeridian() {
        let frame = Frame::new(Geodetic::new(0.0, 179.99, 0.0), Body::Earth.radius_m()).unwrap();
        let dest = frame.destination(90_f64.to_radians(), 5_000.0);
        assert!(dest.x < -179.9);
    }

    #[test]
    fn test_normalize_lon() {
        assert_abs_diff_eq!(normalize_lon(190.0), -170.0);
        assert_abs_diff_eq!(normalize_lon(-190.0), 170.0);
        assert_abs_diff_eq!(normalize_lon(180.0), -180.0);
        assert_abs_diff_eq!(normalize_lon(-105.0), -105.0);
    }
}
