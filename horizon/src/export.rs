//! Delimited encoding of a [HorizonProfile].
//!
//! One header row, `azimuth_deg,horizon_angle_deg,distance_m,quality`,
//! then one row per azimuth. Floats are written in their shortest
//! round-trip form (`NaN` for undetermined values), so reading a
//! written profile back yields identical records.

use crate::{HorizonError, HorizonProfile, HorizonRecord};
use std::io::{Read, Write};

impl HorizonProfile {
    pub fn write_csv<W: Write>(&self, wtr: W) -> Result<(), HorizonError> {
        let mut wtr = csv::Writer::from_writer(wtr);
        for record in self.records() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn read_csv<R: Read>(rdr: R) -> Result<Self, HorizonError> {
        let mut rdr = csv::Reader::from_reader(rdr);
        let records = rdr
            .deserialize::<HorizonRecord>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_records(records))
    }
}

#[cfg(test)]
mod tests {
    use crate::{HorizonProfile, HorizonRecord, Quality, UNDETERMINED};

    #[test]
    fn test_csv_layout() {
        let profile = HorizonProfile::from_records(vec![
            HorizonRecord {
                azimuth_deg: 0.0,
                horizon_angle_deg: -0.045_4,
                distance_m: 5_050.0,
                quality: Quality::Ok,
            },
            HorizonRecord {
                azimuth_deg: 0.5,
                horizon_angle_deg: UNDETERMINED,
                distance_m: UNDETERMINED,
                quality: Quality::Undetermined,
            },
        ]);
        let mut buf = Vec::new();
        profile.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "azimuth_deg,horizon_angle_deg,distance_m,quality");
        assert_eq!(lines[1], "0.0,-0.0454,5050.0,OK");
        assert_eq!(lines[2], "0.5,NaN,NaN,UNDETERMINED");
        assert_eq!(lines.len(), 3);

        let back = HorizonProfile::read_csv(text.as_bytes()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.records()[0], profile.records()[0]);
        assert!(back.records()[1].horizon_angle_deg.is_nan());
        assert_eq!(back.records()[1].quality, Quality::Undetermined);
        assert_eq!(back.summary(), profile.summary());
    }

    #[test]
    fn test_bad_quality() {
        let text = "azimuth_deg,horizon_angle_deg,distance_m,quality\n0.0,1.0,2.0,GREAT\n";
        assert!(HorizonProfile::read_csv(text.as_bytes()).is_err());
    }
}
