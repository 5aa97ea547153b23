use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Reference body whose mean sphere models surface curvature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Earth,
    Moon,
}

impl Body {
    /// Volumetric mean radius in meters.
    pub const fn radius_m(self) -> f64 {
        match self {
            Self::Earth => 6_371_000.0,
            Self::Moon => 1_737_400.0,
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earth => f.write_str("earth"),
            Self::Moon => f.write_str("moon"),
        }
    }
}

impl FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "earth" => Ok(Self::Earth),
            "moon" | "luna" => Ok(Self::Moon),
            other => Err(format!("unknown body '{other}', expected 'earth' or 'moon'")),
        }
    }
}
