use crate::{math::sample_count, Body, HorizonError};
use serde::{Deserialize, Serialize};

/// How apparent elevation angles account for the body's curvature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curvature {
    /// Lower each sample by `d² / 2R` and measure the angle in the
    /// observer's tangent plane.
    #[default]
    TangentPlane,

    /// Place each sample on the sphere and measure the angle in the
    /// observer's ENU frame.
    Spherical,
}

/// Parameters of a horizon sweep.
///
/// Construct with [HorizonConfig::builder].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonConfig {
    azimuth_resolution_deg: f64,
    max_distance_m: f64,
    radial_step_m: f64,
    min_distance_m: f64,
    max_consecutive_gaps: usize,
    curvature: Curvature,
}

impl HorizonConfig {
    pub const DEFAULT_AZIMUTH_RESOLUTION_DEG: f64 = 1.0;
    pub const DEFAULT_MAX_CONSECUTIVE_GAPS: usize = 16;

    /// Most azimuths a sweep may have (a 0.0001° resolution).
    pub const MAX_AZIMUTHS: usize = 3_600_000;

    /// Most samples a single ray may take.
    pub const MAX_SAMPLES_PER_RAY: usize = 10_000_000;

    pub fn builder() -> HorizonConfigBuilder {
        HorizonConfigBuilder::default()
    }

    pub fn azimuth_resolution_deg(&self) -> f64 {
        self.azimuth_resolution_deg
    }

    pub fn max_distance_m(&self) -> f64 {
        self.max_distance_m
    }

    pub fn radial_step_m(&self) -> f64 {
        self.radial_step_m
    }

    pub fn min_distance_m(&self) -> f64 {
        self.min_distance_m
    }

    pub fn max_consecutive_gaps(&self) -> usize {
        self.max_consecutive_gaps
    }

    pub fn curvature(&self) -> Curvature {
        self.curvature
    }

    /// Returns an error if any parameter is out of bounds.
    ///
    /// [HorizonConfigBuilder::build] already does this, but a config
    /// may also arrive through deserialization.
    pub fn validate(&self) -> Result<(), HorizonError> {
        let res = self.azimuth_resolution_deg;
        if !(res > 0.0 && res <= 360.0) {
            return Err(HorizonError::Config("azimuth resolution must be in (0, 360]"));
        }
        if !(self.max_distance_m.is_finite() && self.max_distance_m > 0.0) {
            return Err(HorizonError::Config("max distance must be positive and finite"));
        }
        if !(self.radial_step_m > 0.0 && self.radial_step_m <= self.max_distance_m) {
            return Err(HorizonError::Config(
                "radial step must be positive and no larger than max distance",
            ));
        }
        if !(self.min_distance_m > 0.0 && self.min_distance_m <= self.max_distance_m) {
            return Err(HorizonError::Config(
                "min distance must be positive and no larger than max distance",
            ));
        }
        if self.azimuth_count() > Self::MAX_AZIMUTHS {
            return Err(HorizonError::Config("azimuth resolution is too fine"));
        }
        if self.sample_count() > Self::MAX_SAMPLES_PER_RAY {
            return Err(HorizonError::Config("too many samples per ray"));
        }
        Ok(())
    }

    /// Returns the number of azimuths in a full sweep.
    ///
    /// A resolution that does not divide 360 evenly leaves a shorter
    /// final bin before wrapping.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn azimuth_count(&self) -> usize {
        let n = 360.0 / self.azimuth_resolution_deg;
        let n = if (n - n.round()).abs() < 1e-9 {
            n.round()
        } else {
            n.ceil()
        };
        n as usize
    }

    /// Returns the `n`th azimuth of the sweep, in degrees.
    pub fn azimuth_deg(&self, n: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = n as f64;
        n * self.azimuth_resolution_deg
    }

    /// Returns the number of samples cast along each ray.
    pub fn sample_count(&self) -> usize {
        sample_count(self.min_distance_m, self.radial_step_m, self.max_distance_m)
    }

    /// Returns the search radius as degrees of arc on `body`.
    pub fn angular_extent_deg(&self, body: Body) -> f64 {
        (self.max_distance_m / body.radius_m()).to_degrees()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HorizonConfigBuilder {
    azimuth_resolution_deg: Option<f64>,
    max_distance_m: Option<f64>,
    radial_step_m: Option<f64>,
    min_distance_m: Option<f64>,
    max_consecutive_gaps: Option<usize>,
    curvature: Curvature,
}

impl HorizonConfigBuilder {
    /// Degrees between adjacent azimuths.
    #[must_use]
    pub fn azimuth_resolution(mut self, degrees: f64) -> Self {
        self.azimuth_resolution_deg = Some(degrees);
        self
    }

    /// How far out to search along each ray.
    #[must_use]
    pub fn max_distance(mut self, meters: f64) -> Self {
        self.max_distance_m = Some(meters);
        self
    }

    /// Distance between samples along a ray.
    #[must_use]
    pub fn radial_step(mut self, meters: f64) -> Self {
        self.radial_step_m = Some(meters);
        self
    }

    /// Distance of the first sample. Defaults to the radial step.
    #[must_use]
    pub fn min_distance(mut self, meters: f64) -> Self {
        self.min_distance_m = Some(meters);
        self
    }

    /// Number of consecutive unusable samples tolerated before a
    /// ray gives up.
    #[must_use]
    pub fn max_consecutive_gaps(mut self, gaps: usize) -> Self {
        self.max_consecutive_gaps = Some(gaps);
        self
    }

    #[must_use]
    pub fn curvature(mut self, curvature: Curvature) -> Self {
        self.curvature = curvature;
        self
    }

    pub fn build(&self) -> Result<HorizonConfig, HorizonError> {
        let (Some(max_distance_m), Some(radial_step_m)) = (self.max_distance_m, self.radial_step_m)
        else {
            return Err(HorizonError::Config("max distance and radial step are required"));
        };
        let config = HorizonConfig {
            azimuth_resolution_deg: self
                .azimuth_resolution_deg
                .unwrap_or(HorizonConfig::DEFAULT_AZIMUTH_RESOLUTION_DEG),
            max_distance_m,
            radial_step_m,
            min_distance_m: self.min_distance_m.unwrap_or(radial_step_m),
            max_consecutive_gaps: self
                .max_consecutive_gaps
                .unwrap_or(HorizonConfig::DEFAULT_MAX_CONSECUTIVE_GAPS),
            curvature: self.curvature,
        };
        config.validate()?;
        Ok(config)
    }
}
