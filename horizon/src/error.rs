use dem::DemError;
use geo::geometry::Coord;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HorizonError {
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    #[error("geodetic coordinate out of range: lat {lat}, lon {lon}")]
    OutOfRange { lat: f64, lon: f64 },

    #[error("no elevation data under observer at {0:?}")]
    ObserverUncovered(Coord<f64>),

    #[error("none of the {azimuths} azimuths had usable terrain samples")]
    InsufficientData { azimuths: usize },

    #[error("horizon sweep cancelled")]
    Cancelled,

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("{0}")]
    Dem(#[from] DemError),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}
