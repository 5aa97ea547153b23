//! Directory of SRTM/NASADEM `.hgt` tiles.

use crate::HorizonError;
use dem::Tile;
use geo::geometry::{Coord, Rect};
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TileDir {
    /// Directory containing HGT tile files.
    dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    mode: TileMode,
}

impl TileDir {
    pub fn new(dir: PathBuf, mode: TileMode) -> Result<Self, HorizonError> {
        let mut has_height_files = false;

        // Fail early if `dir` has no `hgt` files at all.
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if Some("hgt") == path.extension().and_then(std::ffi::OsStr::to_str) {
                has_height_files = true;
                break;
            }
        }

        if has_height_files {
            Ok(Self { dir, mode })
        } else {
            Err(HorizonError::Path(dir))
        }
    }

    /// Returns the whole-degree cells intersecting `region`, paired
    /// with the path of the tile file for each cell present on disk.
    pub fn tiles_in(&self, region: &Rect<f64>) -> Vec<(Coord<i32>, PathBuf)> {
        let Coord { x: min_x, y: min_y } = sw_corner(region.min());
        let Coord { x: max_x, y: max_y } = sw_corner(region.max());
        let mut found = Vec::new();
        for y in min_y.max(-90)..=max_y.min(89) {
            for x in min_x.max(-180)..=max_x.min(179) {
                let cell = Coord { x, y };
                if let Some(path) = self.path_for(cell) {
                    found.push((cell, path));
                }
            }
        }
        found
    }

    /// Loads the tile at `path` according to this directory's mode.
    pub fn load(&self, path: &Path) -> Result<Tile, HorizonError> {
        debug!("loading {path:?}");
        match self.mode {
            TileMode::InMem => Ok(Tile::load(path)?),
            TileMode::MemMap => Ok(Tile::memmap(path)?),
        }
    }
}

/// Private API.
impl TileDir {
    fn path_for(&self, cell: Coord<i32>) -> Option<PathBuf> {
        let file_name = file_name(cell);
        let path = self.dir.join(&file_name);
        if path.exists() {
            return Some(path);
        }
        let path = self.dir.join(file_name.to_lowercase());
        path.exists().then_some(path)
    }
}

/// How to handle tile.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Parse tile and load into memory.
    ///
    /// Note that this can consume gigabytes of RAM when loading many
    /// tiles.
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// Returns the southwest corner of the whole-degree cell containing
/// `coord`.
pub(crate) fn sw_corner(Coord { x, y }: Coord<f64>) -> Coord<i32> {
    #[allow(clippy::cast_possible_truncation)]
    Coord {
        x: (x.floor() as i32),
        y: (y.floor() as i32),
    }
}

/// Returns the expected file name for a cell.
fn file_name(Coord { x, y }: Coord<i32>) -> String {
    let (n_s, lat) = {
        let lat = y.abs();
        let n_s = if y.is_negative() { 'S' } else { 'N' };
        (n_s, lat)
    };
    let (e_w, lon) = {
        let lon = x.abs();
        let e_w = if x.is_negative() { 'W' } else { 'E' };
        (e_w, lon)
    };
    format!("{n_s}{lat:02}{e_w}{lon:03}.hgt")
}

/// Writes a 3-arcsecond `.hgt` file named after `cell` into `dir`,
/// with the sample at column `x`, row `y` (from the south) set to
/// `f(x, y)`.
#[cfg(test)]
pub(crate) fn write_hgt(dir: &Path, cell: Coord<i32>, f: impl Fn(usize, usize) -> i16) -> PathBuf {
    use byteorder::{BigEndian as BE, WriteBytesExt};
    use std::io::{BufWriter, Write};

    const DIM: usize = 1201;
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name(cell));
    let mut wtr = BufWriter::new(std::fs::File::create(&path).unwrap());
    for y in (0..DIM).rev() {
        for x in 0..DIM {
            wtr.write_i16::<BE>(f(x, y)).unwrap();
        }
    }
    wtr.flush().unwrap();
    path
}

/// Returns an empty scratch directory unique to this process and
/// `test`.
#[cfg(test)]
pub(crate) fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("horizon-{}-{test}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
