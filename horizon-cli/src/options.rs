use anyhow::{anyhow, Error as AnyError};
use clap::{Parser, Subcommand};
use geo::geometry::Coord;
use horizon::Body;
use std::{path::PathBuf, str::FromStr};

/// Compute the terrain horizon seen from a point.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Directory of elevation tiles.
    #[arg(short, long)]
    pub tile_dir: PathBuf,

    /// Memory map tiles instead of reading them into memory.
    #[arg(long, default_value_t = false)]
    pub memmap: bool,

    /// Reference body, 'earth' or 'moon'.
    #[arg(short, long, default_value_t = Body::Earth)]
    pub body: Body,

    /// Observer "lat,lon,height", where 'height' is meters above
    /// ground.
    #[arg(short, long)]
    pub observer: LatLonAlt,

    /// Degrees between azimuths.
    #[arg(short, long, default_value_t = 1.0)]
    pub azimuth_resolution: f64,

    /// How far to search for terrain, in meters.
    #[arg(short, long, default_value_t = 50_000.0)]
    pub max_distance: f64,

    /// Distance between samples along a ray, in meters.
    #[arg(short, long, default_value_t = 90.0)]
    pub radial_step: f64,

    /// Distance of the first sample, in meters. Defaults to the
    /// radial step.
    #[arg(long)]
    pub min_distance: Option<f64>,

    /// Consecutive missing samples tolerated before a ray gives up.
    #[arg(long)]
    pub max_gaps: Option<usize>,

    /// Use exact spherical geometry instead of the tangent plane
    /// curvature correction.
    #[arg(short, long, default_value_t = false)]
    pub spherical: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Debug, Copy)]
pub struct LatLonAlt(pub Coord<f64>, pub f64);

impl FromStr for LatLonAlt {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let mut parts = s.split(',');
        let (Some(lat_str), Some(lon_str), Some(alt_str), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("not a valid lat,lon,height"));
        };
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        let alt = f64::from_str(alt_str.trim())?;
        Ok(Self(Coord { y: lat, x: lon }, alt))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the horizon profile to stdout as CSV.
    Csv,

    /// Print the horizon profile to stdout as JSON.
    Json,

    /// Print how many azimuths are complete, partial, or
    /// undetermined.
    Summary,
}

#[cfg(test)]
mod tests {
    use super::LatLonAlt;

    #[test]
    fn test_parse_lat_lon_alt() {
        let LatLonAlt(coord, alt) = "40.0, -105.0, 2".parse().unwrap();
        assert_eq!((coord.y, coord.x, alt), (40.0, -105.0, 2.0));
        assert!("40.0,-105.0".parse::<LatLonAlt>().is_err());
        assert!("40.0,-105.0,2,1".parse::<LatLonAlt>().is_err());
        assert!("north,-105.0,2".parse::<LatLonAlt>().is_err());
    }
}
