use crate::{math::check_geodetic, Body, HorizonError};
use geo::geometry::Coord;
use serde::{Deserialize, Serialize};

/// Where the horizon is seen from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    body: Body,
    lat_deg: f64,
    lon_deg: f64,
    /// Height above the local ground surface, meters.
    height_m: f64,
}

impl Observer {
    /// Returns an observer `height_m` above the ground at
    /// (`lat_deg`, `lon_deg`) on `body`.
    pub fn new(body: Body, lat_deg: f64, lon_deg: f64, height_m: f64) -> Result<Self, HorizonError> {
        check_geodetic(lat_deg, lon_deg)?;
        if !(height_m.is_finite() && height_m >= 0.0) {
            return Err(HorizonError::Config("observer height must be finite and >= 0"));
        }
        Ok(Self {
            body,
            lat_deg,
            lon_deg,
            height_m,
        })
    }

    pub fn body(&self) -> Body {
        self.body
    }

    pub fn lat_deg(&self) -> f64 {
        self.lat_deg
    }

    pub fn lon_deg(&self) -> f64 {
        self.lon_deg
    }

    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// Returns the observer's (lon, lat).
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon_deg,
            y: self.lat_deg,
        }
    }
}
