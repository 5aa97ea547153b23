//! Gridded elevation tiles.
//!
//! A [Tile] is a regular latitude/longitude grid of elevation samples
//! with a known extent, sample spacing, and void (no-data) marker.
//! Tiles come either from SRTM/NASADEM `.hgt` files or from sample
//! buffers handed over by an external raster reader.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::DemError;
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::{Coord, Rect};
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

const ARCSEC_PER_DEG: C = 3600.0;

/// Void marker used by `.hgt` files.
pub const HGT_VOID: i16 = -32768;

/// Slack, in fractional sample indices, granted to points that land a
/// rounding error outside a tile's edge.
pub const EDGE_EPSILON: C = 1e-9;

/// Outcome of an elevation lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Elevation {
    /// Interpolated elevation in meters.
    Value(C),

    /// The point is covered, but at least one contributing sample is
    /// void.
    NoData,

    /// The point lies outside every available sample grid.
    OutsideCoverage,
}

impl Elevation {
    /// Returns the elevation in meters, if any.
    pub fn value(self) -> Option<C> {
        match self {
            Self::Value(meters) => Some(meters),
            Self::NoData | Self::OutsideCoverage => None,
        }
    }
}

pub struct Tile {
    /// Southwest corner of the tile.
    ///
    /// Specificlly, the _center_ of the SW most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Northeast corner of the tile.
    ///
    /// Specificlly, the _center_ of the NE most sample of the tile.
    ne_corner_center: Coord<C>,

    /// Degrees between adjacent samples (`x`: longitude, `y`:
    /// latitude).
    spacing: Coord<C>,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Samples equal to this value are voids.
    nodata: f32,

    /// Elevation samples, row-major starting at the north row.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[i16]>),
    MemMap(Mmap),
    Raster(Box<[f32]>),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> f32 {
        match self {
            Self::InMem(samples) => f32::from(samples[index]),
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                let end = start + size_of::<i16>();
                f32::from(BE::read_i16(&raw[start..end]))
            }
            Self::Raster(samples) => samples[index],
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the `.hgt` file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (resolution, dimensions @ (cols, rows)) = extract_resolution(&path)?;
        let sw_corner = parse_sw_corner(&path)?;

        let mut file = BufReader::new(File::open(path)?);
        let samples = {
            let mut sample_store = vec![0_i16; cols * rows];
            file.read_i16_into::<BE>(&mut sample_store)?;
            SampleStore::InMem(sample_store.into_boxed_slice())
        };

        Ok(Self::from_hgt_parts(
            sw_corner, resolution, dimensions, samples,
        ))
    }

    /// Returns a Tile using the memory-mapped `.hgt` file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (resolution, dimensions) = extract_resolution(&path)?;
        let sw_corner = parse_sw_corner(&path)?;

        let samples = {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };

        Ok(Self::from_hgt_parts(
            sw_corner, resolution, dimensions, samples,
        ))
    }

    /// Returns a Tile backed by an in-memory raster.
    ///
    /// `samples` are row-major starting with the northernmost row,
    /// west to east within a row (the `.hgt` layout).
    /// `sw_corner_center` is the center of the southwest-most sample
    /// and `spacing` the distance in degrees between adjacent samples.
    pub fn from_samples(
        sw_corner_center: Coord<C>,
        spacing: Coord<C>,
        dimensions: (usize, usize),
        samples: Vec<f32>,
        nodata: f32,
    ) -> Result<Self, DemError> {
        let (cols, rows) = dimensions;
        if cols < 2 || rows < 2 {
            return Err(DemError::Dimensions(cols, rows));
        }
        let valid_spacing = |s: C| s.is_finite() && s > 0.0;
        if !(valid_spacing(spacing.x) && valid_spacing(spacing.y)) {
            return Err(DemError::Spacing);
        }
        if samples.len() != cols * rows {
            return Err(DemError::SampleCount {
                expected: cols * rows,
                actual: samples.len(),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let ne_corner_center = Coord {
            x: sw_corner_center.x + (cols - 1) as C * spacing.x,
            y: sw_corner_center.y + (rows - 1) as C * spacing.y,
        };

        Ok(Self {
            sw_corner_center,
            ne_corner_center,
            spacing,
            dimensions,
            nodata,
            samples: SampleStore::Raster(samples.into_boxed_slice()),
        })
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Returns the (columns, rows) of this tile.
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Returns the sample spacing in degrees.
    pub fn spacing(&self) -> Coord<C> {
        self.spacing
    }

    /// Returns this tile's void marker.
    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    /// Returns the rectangle spanned by this tile's sample centers.
    pub fn extent(&self) -> Rect<C> {
        Rect::new(self.sw_corner_center, self.ne_corner_center)
    }

    /// Returns `true` if `coord` lies on or within this tile's extent.
    pub fn covers(&self, coord: Coord<C>) -> bool {
        self.fractional_xy(coord).is_some()
    }

    /// Returns the bilinearly interpolated elevation at `coord`.
    ///
    /// Only samples with a non-zero weight take part, so a point
    /// lying exactly on a grid line (or a tile edge) is determined
    /// by the samples on that line alone.
    pub fn elevation_at(&self, coord: Coord<C>) -> Elevation {
        let Some((fx, fy)) = self.fractional_xy(coord) else {
            return Elevation::OutsideCoverage;
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x0, y0) = (fx.floor() as usize, fy.floor() as usize);
        #[allow(clippy::cast_precision_loss)]
        let (tx, ty) = (fx - x0 as C, fy - y0 as C);
        let x1 = if tx > 0.0 { x0 + 1 } else { x0 };
        let y1 = if ty > 0.0 { y0 + 1 } else { y0 };

        let (Some(v00), Some(v10), Some(v01), Some(v11)) = (
            self.get_xy((x0, y0)),
            self.get_xy((x1, y0)),
            self.get_xy((x0, y1)),
            self.get_xy((x1, y1)),
        ) else {
            return Elevation::NoData;
        };

        let south = lerp(C::from(v00), C::from(v10), tx);
        let north = lerp(C::from(v01), C::from(v11), tx);
        Elevation::Value(lerp(south, north, ty))
    }
}

/// Private API
impl Tile {
    fn from_hgt_parts(
        sw_corner: Coord<i16>,
        resolution: u8,
        dimensions: (usize, usize),
        samples: SampleStore,
    ) -> Self {
        let sw_corner_center = Coord {
            x: C::from(sw_corner.x),
            y: C::from(sw_corner.y),
        };
        let step = C::from(resolution) / ARCSEC_PER_DEG;

        #[allow(clippy::cast_precision_loss)]
        let ne_corner_center = Coord {
            x: sw_corner_center.x + (dimensions.0 - 1) as C * step,
            y: sw_corner_center.y + (dimensions.1 - 1) as C * step,
        };

        Self {
            sw_corner_center,
            ne_corner_center,
            spacing: Coord { x: step, y: step },
            dimensions,
            nodata: f32::from(HGT_VOID),
            samples,
        }
    }

    /// Returns the sample at `(x, y)`, where `(0, 0)` is the SW-most
    /// sample, or `None` if it is void.
    #[allow(clippy::float_cmp)]
    fn get_xy(&self, (x, y): (usize, usize)) -> Option<f32> {
        let idx_1d = self.xy_to_linear_index((x, y));
        let sample = self.samples.get_unchecked(idx_1d);
        if sample.is_nan() || sample == self.nodata {
            None
        } else {
            Some(sample)
        }
    }

    /// Converts `coord` to fractional (x, y) sample indices, or `None`
    /// if it falls outside the grid.
    fn fractional_xy(&self, coord: Coord<C>) -> Option<(C, C)> {
        #[allow(clippy::cast_precision_loss)]
        let (max_x, max_y) = ((self.dimensions.0 - 1) as C, (self.dimensions.1 - 1) as C);
        let fx = (coord.x - self.sw_corner_center.x) / self.spacing.x;
        let fy = (coord.y - self.sw_corner_center.y) / self.spacing.y;
        let in_range = |f: C, max: C| (-EDGE_EPSILON..=max + EDGE_EPSILON).contains(&f);
        if in_range(fx, max_x) && in_range(fy, max_y) {
            Some((fx.clamp(0.0, max_x), fy.clamp(0.0, max_y)))
        } else {
            None
        }
    }

    #[cfg(test)]
    fn linear_index_to_xy(&self, idx: usize) -> (usize, usize) {
        let y = idx / self.dimensions.0;
        let x = idx % self.dimensions.0;
        (x, self.dimensions.1 - 1 - y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * (self.dimensions.1 - y - 1) + x
    }
}

fn lerp(a: C, b: C, t: C) -> C {
    a + (b - a) * t
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), DemError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<u16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<u16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(DemError::HgtLen(invalid_len, path.as_ref().to_owned())),
    }
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, DemError> {
    let mk_err = || DemError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
