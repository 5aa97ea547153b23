use crate::{
    math::{elevation_angle, Frame, Geodetic, RayIter},
    Curvature, HorizonConfig, HorizonError, Mosaic, Observer,
};
use dem::Elevation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Angle and distance reported for an azimuth without usable samples.
pub const UNDETERMINED: f64 = f64::NAN;

/// How much of a ray's terrain was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Quality {
    /// Every gap along the ray was within tolerance.
    Ok,

    /// The ray gave up early after too many consecutive gaps; the
    /// angle reflects the terrain seen before that.
    Partial,

    /// Not a single usable sample; angle and distance are
    /// [UNDETERMINED].
    Undetermined,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Partial => f.write_str("PARTIAL"),
            Self::Undetermined => f.write_str("UNDETERMINED"),
        }
    }
}

/// Result of casting a single ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCast {
    /// Highest apparent elevation angle, degrees above the local
    /// horizontal.
    pub angle_deg: f64,

    /// Great-circle distance to the sample attaining `angle_deg`.
    pub distance_m: f64,

    pub quality: Quality,
}

/// Casts rays from one observer over a [Mosaic].
pub struct RayCaster<'a> {
    mosaic: &'a Mosaic,
    config: &'a HorizonConfig,
    /// Observer's tangent frame, origin at eye level.
    frame: Frame,
    observer_elevation_m: f64,
}

impl<'a> RayCaster<'a> {
    /// Returns an error if `config` is invalid or the ground under
    /// `observer` has no elevation in `mosaic`.
    pub fn new(
        observer: &Observer,
        config: &'a HorizonConfig,
        mosaic: &'a Mosaic,
    ) -> Result<Self, HorizonError> {
        config.validate()?;
        let ground_m = mosaic
            .elevation_at(observer.coord())
            .value()
            .ok_or(HorizonError::ObserverUncovered(observer.coord()))?;
        let observer_elevation_m = ground_m + observer.height_m();
        let frame = Frame::new(
            Geodetic::new(observer.lat_deg(), observer.lon_deg(), observer_elevation_m),
            observer.body().radius_m(),
        )?;
        Ok(Self {
            mosaic,
            config,
            frame,
            observer_elevation_m,
        })
    }

    /// Ground elevation under the observer plus its height above
    /// ground.
    pub fn observer_elevation_m(&self) -> f64 {
        self.observer_elevation_m
    }

    /// Walks outward along `azimuth_deg` (clockwise from north) and
    /// returns the highest apparent terrain angle.
    ///
    /// Voids and uncovered samples are skipped. More than
    /// `max_consecutive_gaps` of them in a row ends the ray early.
    pub fn cast(&self, azimuth_deg: f64) -> RayCast {
        let config = self.config;
        let mut highest = Highest::default();
        let mut gap_run = 0;
        let mut truncated = false;

        for (distance_m, coord) in RayIter::new(
            &self.frame,
            azimuth_deg.to_radians(),
            config.min_distance_m(),
            config.radial_step_m(),
            config.max_distance_m(),
        ) {
            match self.mosaic.elevation_at(coord) {
                Elevation::Value(terrain_m) => {
                    gap_run = 0;
                    let angle = match config.curvature() {
                        Curvature::TangentPlane => elevation_angle(
                            self.observer_elevation_m,
                            distance_m,
                            terrain_m,
                            self.frame.radius_m(),
                        ),
                        Curvature::Spherical => self
                            .frame
                            .project(Geodetic::new(coord.y, coord.x, terrain_m))
                            .elevation_angle(),
                    };
                    highest.offer(angle, distance_m);
                }
                Elevation::NoData | Elevation::OutsideCoverage => {
                    gap_run += 1;
                    if gap_run > config.max_consecutive_gaps() {
                        truncated = true;
                        break;
                    }
                }
            }
        }

        match highest.0 {
            None => RayCast {
                angle_deg: UNDETERMINED,
                distance_m: UNDETERMINED,
                quality: Quality::Undetermined,
            },
            Some((angle, distance_m)) => RayCast {
                angle_deg: angle.to_degrees(),
                distance_m,
                quality: if truncated {
                    Quality::Partial
                } else {
                    Quality::Ok
                },
            },
        }
    }
}

/// Running maximum of (angle, distance), fed nearest first.
///
/// Only a strictly higher angle replaces the current one, so ties go
/// to the nearest sample.
#[derive(Debug, Default)]
struct Highest(Option<(f64, f64)>);

impl Highest {
    fn offer(&mut self, angle: f64, distance_m: f64) {
        match self.0 {
            Some((best, _)) if angle <= best => {}
            _ => self.0 = Some((angle, distance_m)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Highest, Quality, RayCast, RayCaster};
    use crate::{Body, Curvature, HorizonConfig, HorizonError, Mosaic, Observer};
    use approx::assert_relative_eq;
    use dem::Tile;
    use geo::geometry::Coord;

    const NODATA: f32 = -9999.0;

    /// 2°x2° tile around (0, 0), 0.01° spacing, `f(lon, lat)`.
    fn equatorial_tile(f: impl Fn(f64, f64) -> f32) -> Tile {
        let mut samples = Vec::with_capacity(201 * 201);
        for row in (0..201).rev() {
            for col in 0..201 {
                let (lon, lat) = (-1.0 + f64::from(col) * 0.01, -1.0 + f64::from(row) * 0.01);
                samples.push(f(lon, lat));
            }
        }
        Tile::from_samples(
            Coord { x: -1.0, y: -1.0 },
            Coord { x: 0.01, y: 0.01 },
            (201, 201),
            samples,
            NODATA,
        )
        .unwrap()
    }

    fn config(max_distance: f64) -> HorizonConfig {
        HorizonConfig::builder()
            .max_distance(max_distance)
            .radial_step(10.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_nearest_wins_ties() {
        let mut highest = Highest::default();
        highest.offer(0.1, 100.0);
        highest.offer(0.3, 200.0);
        highest.offer(0.3, 300.0);
        highest.offer(0.2, 400.0);
        assert_eq!(highest.0, Some((0.3, 200.0)));
    }

    #[test]
    fn test_ridge() {
        let mosaic = Mosaic::new();
        // A 500 m plateau east of 0.1°E.
        mosaic.insert(equatorial_tile(|lon, _| if lon >= 0.1 - 1e-9 { 500.0 } else { 0.0 }));
        let observer = Observer::new(Body::Earth, 0.0, 0.0, 2.0).unwrap();
        let config = config(20_000.0);
        let caster = RayCaster::new(&observer, &config, &mosaic).unwrap();
        assert_relative_eq!(caster.observer_elevation_m(), 2.0);

        let east = caster.cast(90.0);
        let radius = Body::Earth.radius_m();
        let ridge_m = 0.1_f64.to_radians() * radius;
        let expected = (498.0 - ridge_m * ridge_m / (2.0 * radius))
            .atan2(ridge_m)
            .to_degrees();
        assert_eq!(east.quality, Quality::Ok);
        assert!((east.distance_m - ridge_m).abs() <= 10.0);
        assert_relative_eq!(east.angle_deg, expected, epsilon = 5e-3);

        let west = caster.cast(270.0);
        assert_eq!(west.quality, Quality::Ok);
        assert!(west.angle_deg < 0.0);
        assert!(east.angle_deg > 2.0);
    }

    #[test]
    fn test_spherical_agrees_on_short_rays() {
        let mosaic = Mosaic::new();
        #[allow(clippy::cast_possible_truncation)]
        let cone = equatorial_tile(|lon, lat| (1000.0 * lon.hypot(lat)) as f32);
        mosaic.insert(cone);
        let observer = Observer::new(Body::Earth, 0.2, 0.3, 5.0).unwrap();
        let tangent = config(5_000.0);
        let spherical = HorizonConfig::builder()
            .max_distance(5_000.0)
            .radial_step(10.0)
            .curvature(Curvature::Spherical)
            .build()
            .unwrap();
        let a = RayCaster::new(&observer, &tangent, &mosaic).unwrap();
        let b = RayCaster::new(&observer, &spherical, &mosaic).unwrap();
        for azimuth in [0.0, 45.0, 123.0, 300.0] {
            let (a, b) = (a.cast(azimuth), b.cast(azimuth));
            assert_relative_eq!(a.angle_deg, b.angle_deg, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_gaps() {
        let mosaic = Mosaic::new();
        // Void east of 0.05°E.
        mosaic.insert(equatorial_tile(|lon, _| if lon > 0.05 { NODATA } else { 0.0 }));
        let observer = Observer::new(Body::Earth, 0.0, 0.0, 2.0).unwrap();
        let config = config(10_000.0);
        let caster = RayCaster::new(&observer, &config, &mosaic).unwrap();
        assert_eq!(caster.cast(90.0).quality, Quality::Partial);
        assert_eq!(caster.cast(270.0).quality, Quality::Ok);
        assert!(caster.cast(90.0).distance_m < 0.05_f64.to_radians() * Body::Earth.radius_m());
    }

    /// One-kilometer columns running east along the equator. The
    /// observer sits between columns 0 and 1, and the ray sample at
    /// `k` km falls midway between columns `k` and `k + 1`. Columns in
    /// `void` are missing, columns from 10 on form a 500 m plateau.
    fn column_tile(void: std::ops::Range<usize>) -> Tile {
        let step = (1_000.0 / Body::Earth.radius_m()).to_degrees();
        let mut samples = Vec::with_capacity(14 * 3);
        for _row in 0..3 {
            for col in 0..14 {
                samples.push(if void.contains(&col) {
                    NODATA
                } else if col >= 10 {
                    500.0
                } else {
                    0.0
                });
            }
        }
        Tile::from_samples(
            Coord {
                x: -0.5 * step,
                y: -step,
            },
            Coord { x: step, y: step },
            (14, 3),
            samples,
            NODATA,
        )
        .unwrap()
    }

    fn cast_east(void: std::ops::Range<usize>, max_gaps: usize) -> RayCast {
        let mosaic = Mosaic::new();
        mosaic.insert(column_tile(void));
        let observer = Observer::new(Body::Earth, 0.0, 0.0, 2.0).unwrap();
        let config = HorizonConfig::builder()
            .max_distance(12_000.0)
            .radial_step(1_000.0)
            .max_consecutive_gaps(max_gaps)
            .build()
            .unwrap();
        RayCaster::new(&observer, &config, &mosaic)
            .unwrap()
            .cast(90.0)
    }

    #[test]
    fn test_gap_run_at_tolerance() {
        // Void columns 5 and 6 blank the samples at 4, 5 and 6 km.
        let cast = cast_east(5..7, 3);
        assert_eq!(cast.quality, Quality::Ok);
        // The plateau beyond the gap still sets the horizon.
        assert_relative_eq!(cast.distance_m, 10_000.0);
        assert!(cast.angle_deg > 2.0);
    }

    #[test]
    fn test_gap_run_past_tolerance() {
        let cast = cast_east(5..7, 2);
        assert_eq!(cast.quality, Quality::Partial);
        assert!(cast.distance_m < 4_000.0);
        assert!(cast.angle_deg < 0.0);
    }

    #[test]
    fn test_zero_gap_tolerance() {
        let clear = cast_east(0..0, 0);
        assert_eq!(clear.quality, Quality::Ok);
        assert_relative_eq!(clear.distance_m, 10_000.0);

        // A single void column blanks two samples.
        let holed = cast_east(5..6, 0);
        assert_eq!(holed.quality, Quality::Partial);
        assert!(holed.distance_m < 4_000.0);
        assert_eq!(cast_east(5..6, 2).quality, Quality::Ok);
        assert_eq!(cast_east(5..6, 1).quality, Quality::Partial);
    }

    #[test]
    fn test_no_samples() {
        let mosaic = Mosaic::new();
        mosaic.insert(
            Tile::from_samples(
                Coord { x: -0.001, y: -0.001 },
                Coord { x: 0.001, y: 0.001 },
                (3, 3),
                vec![10.0; 9],
                NODATA,
            )
            .unwrap(),
        );
        let observer = Observer::new(Body::Earth, 0.0, 0.0, 2.0).unwrap();
        let config = HorizonConfig::builder()
            .max_distance(5_000.0)
            .radial_step(10.0)
            .min_distance(1_000.0)
            .build()
            .unwrap();
        let caster = RayCaster::new(&observer, &config, &mosaic).unwrap();
        assert_relative_eq!(caster.observer_elevation_m(), 12.0);
        let cast = caster.cast(10.0);
        assert_eq!(cast.quality, Quality::Undetermined);
        assert!(cast.angle_deg.is_nan());
        assert!(cast.distance_m.is_nan());

        let elsewhere = Observer::new(Body::Earth, 10.0, 10.0, 2.0).unwrap();
        assert!(matches!(
            RayCaster::new(&elsewhere, &config, &mosaic),
            Err(HorizonError::ObserverUncovered(_))
        ));
    }

    #[test]
    fn test_quality_names() {
        assert_eq!(Quality::Ok.to_string(), "OK");
        assert_eq!(Quality::Undetermined.to_string(), "UNDETERMINED");
    }
}
