//! Terrain horizon profiles.
//!
//! Given an [Observer] standing on the Earth or the Moon and a
//! [Mosaic] of elevation tiles around it, [HorizonProfile::build]
//! sweeps rays at every azimuth and reports the highest apparent
//! terrain angle along each, corrected for the body's curvature.

mod body;
mod config;
mod error;
mod export;
pub mod math;
mod mosaic;
mod observer;
mod profile;
mod ray;
mod tile_dir;

pub use crate::{
    body::Body,
    config::{Curvature, HorizonConfig, HorizonConfigBuilder},
    error::HorizonError,
    mosaic::{search_region, Mosaic},
    observer::Observer,
    profile::{CoverageSummary, HorizonProfile, HorizonRecord},
    ray::{Quality, RayCast, RayCaster, UNDETERMINED},
    tile_dir::{TileDir, TileMode},
};
pub use dem::{Elevation, Tile};
