use crate::{
    ray::{Quality, RayCaster},
    HorizonConfig, HorizonError, Mosaic, Observer,
};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Horizon seen along a single azimuth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonRecord {
    /// Degrees clockwise from north, in [0, 360).
    pub azimuth_deg: f64,

    /// Degrees above the observer's local horizontal.
    pub horizon_angle_deg: f64,

    /// Great-circle distance to the terrain setting the horizon.
    pub distance_m: f64,

    pub quality: Quality,
}

/// Count of records per [Quality].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub ok: usize,
    pub partial: usize,
    pub undetermined: usize,
}

impl CoverageSummary {
    fn tally<'a>(records: impl IntoIterator<Item = &'a HorizonRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                match record.quality {
                    Quality::Ok => summary.ok += 1,
                    Quality::Partial => summary.partial += 1,
                    Quality::Undetermined => summary.undetermined += 1,
                }
                summary
            })
    }

    /// Returns `true` if every azimuth is [Quality::Ok].
    pub fn is_complete(&self) -> bool {
        self.partial == 0 && self.undetermined == 0
    }
}

/// Horizon angle for every azimuth of a full sweep, ordered by
/// azimuth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonProfile {
    records: Vec<HorizonRecord>,
    summary: CoverageSummary,
}

impl HorizonProfile {
    /// Sweeps rays from `observer` over `mosaic` at every azimuth of
    /// `config`.
    ///
    /// Tiles the sweep may need are preloaded first when `mosaic` has
    /// a tile directory. Fails with
    /// [InsufficientData](HorizonError::InsufficientData) if no
    /// azimuth found any terrain.
    pub fn build(
        observer: &Observer,
        mosaic: &Mosaic,
        config: &HorizonConfig,
    ) -> Result<Self, HorizonError> {
        Self::build_cancellable(observer, mosaic, config, &AtomicBool::new(false))
    }

    /// Like [HorizonProfile::build], but abandons the sweep with
    /// [Cancelled](HorizonError::Cancelled) once `cancel` is set.
    pub fn build_cancellable(
        observer: &Observer,
        mosaic: &Mosaic,
        config: &HorizonConfig,
        cancel: &AtomicBool,
    ) -> Result<Self, HorizonError> {
        config.validate()?;
        mosaic.preload_around(observer, config.max_distance_m())?;
        let caster = RayCaster::new(observer, config, mosaic)?;
        let azimuths = config.azimuth_count();

        let (records, sweep_runtime) = {
            let now = std::time::Instant::now();
            let records = (0..azimuths)
                .into_par_iter()
                .map(|n| {
                    if cancel.load(Ordering::Relaxed) {
                        return Err(HorizonError::Cancelled);
                    }
                    let azimuth_deg = config.azimuth_deg(n);
                    let cast = caster.cast(azimuth_deg);
                    Ok(HorizonRecord {
                        azimuth_deg,
                        horizon_angle_deg: cast.angle_deg,
                        distance_m: cast.distance_m,
                        quality: cast.quality,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            (records, now.elapsed())
        };

        let summary = CoverageSummary::tally(&records);
        debug!(
            "horizon; observer: {:?}, elev: {}, azimuths: {}, samples/ray: {}, exec: {:?}",
            observer.coord(),
            caster.observer_elevation_m(),
            azimuths,
            config.sample_count(),
            sweep_runtime
        );

        if summary.undetermined == azimuths {
            return Err(HorizonError::InsufficientData { azimuths });
        }
        if !summary.is_complete() {
            warn!(
                "incomplete horizon at {:?}; partial: {}, undetermined: {}",
                observer.coord(),
                summary.partial,
                summary.undetermined
            );
        }

        Ok(Self { records, summary })
    }

    /// Returns a profile holding `records` as given.
    pub fn from_records(records: Vec<HorizonRecord>) -> Self {
        let summary = CoverageSummary::tally(&records);
        Self { records, summary }
    }

    pub fn records(&self) -> &[HorizonRecord] {
        &self.records
    }

    pub fn summary(&self) -> CoverageSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CoverageSummary, HorizonProfile, HorizonRecord};
    use crate::Quality;

    fn record(azimuth_deg: f64, quality: Quality) -> HorizonRecord {
        HorizonRecord {
            azimuth_deg,
            horizon_angle_deg: 1.0,
            distance_m: 100.0,
            quality,
        }
    }

    #[test]
    fn test_summary() {
        let profile = HorizonProfile::from_records(vec![
            record(0.0, Quality::Ok),
            record(90.0, Quality::Partial),
            record(180.0, Quality::Ok),
            record(270.0, Quality::Undetermined),
        ]);
        assert_eq!(profile.len(), 4);
        assert_eq!(
            profile.summary(),
            CoverageSummary {
                ok: 2,
                partial: 1,
                undetermined: 1
            }
        );
        assert!(!profile.summary().is_complete());
        assert!(HorizonProfile::from_records(vec![]).summary().is_complete());
    }
}
