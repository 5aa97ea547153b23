mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use horizon::{Curvature, HorizonConfig, HorizonProfile, Mosaic, Observer, TileDir, TileMode};
use log::info;
use options::{Cli, Command as CliCmd, LatLonAlt};
use serde::Serialize;

fn main() -> Result<(), AnyError> {
    let Cli {
        tile_dir,
        memmap,
        body,
        observer: LatLonAlt(coord, height),
        azimuth_resolution,
        max_distance,
        radial_step,
        min_distance,
        max_gaps,
        spherical,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let observer = Observer::new(body, coord.y, coord.x, height)?;

    let config = {
        let mut builder = HorizonConfig::builder()
            .azimuth_resolution(azimuth_resolution)
            .max_distance(max_distance)
            .radial_step(radial_step)
            .curvature(if spherical {
                Curvature::Spherical
            } else {
                Curvature::TangentPlane
            });
        if let Some(meters) = min_distance {
            builder = builder.min_distance(meters);
        }
        if let Some(gaps) = max_gaps {
            builder = builder.max_consecutive_gaps(gaps);
        }
        builder.build()?
    };

    let tile_mode = if memmap {
        TileMode::MemMap
    } else {
        TileMode::InMem
    };
    let mosaic = Mosaic::with_dir(TileDir::new(tile_dir, tile_mode)?);

    info!("observer: {observer:?}, config: {config:?}");
    let profile = HorizonProfile::build(&observer, &mosaic, &config)?;

    match cmd {
        CliCmd::Csv => profile.write_csv(std::io::stdout().lock())?,
        CliCmd::Json => print_json(&profile)?,
        CliCmd::Summary => {
            let summary = profile.summary();
            println!(
                "ok: {}, partial: {}, undetermined: {}",
                summary.ok, summary.partial, summary.undetermined
            );
        }
    };
    Ok(())
}

fn print_json(profile: &HorizonProfile) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        azimuth: f64,
        /// `None` (null) when undetermined.
        angle: Option<f64>,
        distance: Option<f64>,
        quality: horizon::Quality,
    }

    let reshaped: Vec<JsonEntry> = profile
        .records()
        .iter()
        .map(|record| JsonEntry {
            azimuth: record.azimuth_deg,
            angle: Some(record.horizon_angle_deg).filter(|a| !a.is_nan()),
            distance: Some(record.distance_m).filter(|d| !d.is_nan()),
            quality: record.quality,
        })
        .collect();
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}
