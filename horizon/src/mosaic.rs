//! A queryable elevation surface stitched from many tiles.
//!
//! Tiles are bucketed under every whole-degree cell their extent
//! touches. A query looks in its cell's bucket only, where tiles are
//! ordered finest first (then south-west first, then oldest first).
//! The first tile that yields a value answers the query, so a given
//! point always resolves to the same tile.

use crate::{
    math::normalize_lon,
    tile_dir::{sw_corner, TileDir},
    HorizonError, Observer,
};
use dashmap::DashMap;
use dem::{Elevation, Tile, EDGE_EPSILON};
use geo::geometry::{Coord, Rect};
use log::debug;
use rayon::prelude::*;
use std::{
    cmp::Ordering,
    sync::{
        atomic::{AtomicUsize, Ordering as AtomicOrdering},
        Arc,
    },
};

pub struct Mosaic {
    /// Where to find tiles not yet loaded.
    source: Option<TileDir>,

    /// Tiles touching each whole-degree cell, in query order.
    cells: DashMap<Coord<i32>, Vec<Entry>>,

    /// Cells already fetched from `source`.
    fetched: DashMap<Coord<i32>, bool>,

    /// Number of tiles inserted so far.
    seq: AtomicUsize,
}

struct Entry {
    seq: usize,
    tile: Arc<Tile>,
}

impl Entry {
    fn priority(&self, other: &Self) -> Ordering {
        let (a, b) = (self.tile.spacing(), other.tile.spacing());
        let (a_min, b_min) = (self.tile.extent().min(), other.tile.extent().min());
        a.y.total_cmp(&b.y)
            .then(a.x.total_cmp(&b.x))
            .then(a_min.y.total_cmp(&b_min.y))
            .then(a_min.x.total_cmp(&b_min.x))
            .then(self.seq.cmp(&other.seq))
    }
}

impl Mosaic {
    /// Returns an empty mosaic; add tiles with [Mosaic::insert].
    pub fn new() -> Self {
        Self {
            source: None,
            cells: DashMap::new(),
            fetched: DashMap::new(),
            seq: AtomicUsize::new(0),
        }
    }

    /// Returns an empty mosaic which loads tiles from `source` on
    /// [Mosaic::preload].
    pub fn with_dir(source: TileDir) -> Self {
        Self {
            source: Some(source),
            ..Self::new()
        }
    }

    /// Adds an already loaded tile.
    pub fn insert(&self, tile: Tile) {
        let seq = self.seq.fetch_add(1, AtomicOrdering::SeqCst);
        let extent = tile.extent();
        let spacing = tile.spacing();
        let slack = Coord {
            x: spacing.x * EDGE_EPSILON,
            y: spacing.y * EDGE_EPSILON,
        };
        let min = sw_corner(extent.min() - slack);
        let max = sw_corner(extent.max() + slack);
        let tile = Arc::new(tile);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let mut bucket = self.cells.entry(Coord { x, y }).or_default();
                let entry = Entry {
                    seq,
                    tile: Arc::clone(&tile),
                };
                let at = bucket
                    .binary_search_by(|probe| probe.priority(&entry))
                    .unwrap_or_else(|at| at);
                bucket.insert(at, entry);
            }
        }
    }

    /// Loads every tile intersecting `region` from this mosaic's
    /// directory, returning how many were newly loaded.
    ///
    /// Safe to call concurrently; each tile is loaded at most once.
    pub fn preload(&self, region: &Rect<f64>) -> Result<usize, HorizonError> {
        let Some(source) = &self.source else {
            return Ok(0);
        };
        let loaded = AtomicUsize::new(0);
        source
            .tiles_in(region)
            .par_iter()
            .try_for_each(|(cell, path)| {
                self.fetched
                    .entry(*cell)
                    .or_try_insert_with(|| {
                        self.insert(source.load(path)?);
                        loaded.fetch_add(1, AtomicOrdering::Relaxed);
                        Ok::<_, HorizonError>(true)
                    })
                    .map(|_| ())
            })?;
        Ok(loaded.into_inner())
    }

    /// Loads every tile that rays cast from `observer` out to
    /// `max_distance_m` may sample.
    pub fn preload_around(&self, observer: &Observer, max_distance_m: f64) -> Result<usize, HorizonError> {
        let now = std::time::Instant::now();
        let mut loaded = 0;
        for region in search_region(observer, max_distance_m) {
            loaded += self.preload(&region)?;
        }
        debug!(
            "preload; observer: {:?}, loaded: {loaded}, total: {}, exec: {:?}",
            observer.coord(),
            self.len(),
            now.elapsed()
        );
        Ok(loaded)
    }

    /// Returns the elevation at `coord` (x: longitude, y: latitude).
    ///
    /// Never touches the disk; tiles must be inserted or preloaded
    /// beforehand.
    pub fn elevation_at(&self, coord: Coord<f64>) -> Elevation {
        let coord = Coord {
            x: normalize_lon(coord.x),
            y: coord.y,
        };
        let Some(bucket) = self.cells.get(&sw_corner(coord)) else {
            return Elevation::OutsideCoverage;
        };
        let mut fallback = Elevation::OutsideCoverage;
        for entry in bucket.iter() {
            match entry.tile.elevation_at(coord) {
                value @ Elevation::Value(_) => return value,
                Elevation::NoData => fallback = Elevation::NoData,
                Elevation::OutsideCoverage => {}
            }
        }
        fallback
    }

    /// Returns the number of tiles in this mosaic.
    pub fn len(&self) -> usize {
        self.seq.load(AtomicOrdering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Mosaic {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the bounding rectangles of the spherical cap of radius
/// `max_distance_m` around `observer`, split at the antimeridian.
pub fn search_region(observer: &Observer, max_distance_m: f64) -> Vec<Rect<f64>> {
    let extent = (max_distance_m / observer.body().radius_m()).to_degrees();
    let (lat, lon) = (observer.lat_deg(), observer.lon_deg());
    let min_y = (lat - extent).max(-90.0);
    let max_y = (lat + extent).min(90.0);

    // A cap reaching a pole spans every longitude.
    if lat.abs() + extent >= 90.0 {
        return vec![Rect::new(
            Coord { x: -180.0, y: min_y },
            Coord { x: 180.0, y: max_y },
        )];
    }

    let half_width = (extent.to_radians().sin() / lat.to_radians().cos())
        .asin()
        .to_degrees();
    let (min_x, max_x) = (lon - half_width, lon + half_width);
    let rect = |min_x, max_x| Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y });
    if min_x < -180.0 {
        vec![rect(min_x + 360.0, 180.0), rect(-180.0, max_x)]
    } else if max_x > 180.0 {
        vec![rect(min_x, 180.0), rect(-180.0, max_x - 360.0)]
    } else {
        vec![rect(min_x, max_x)]
    }
}
