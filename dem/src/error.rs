use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("expected {expected} samples for raster, got {actual}")]
    SampleCount { expected: usize, actual: usize },

    #[error("raster needs at least 2x2 samples, got {0}x{1}")]
    Dimensions(usize, usize),

    #[error("sample spacing must be positive and finite")]
    Spacing,
}
