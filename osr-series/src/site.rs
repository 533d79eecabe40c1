use crate::error::{Result, SeriesError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Latest year any loader will accept.
pub const LAST_SUPPORTED_YEAR: i32 = 2100;

/// A monitored location that produces one daily value per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Site {
    /// Albion test fishery on the lower Fraser River, catch per unit effort.
    AlbionCpue,
    /// Bonneville Dam adult Chinook passage count.
    BonnevilleCount,
    /// Lake Washington (Ballard Locks) daily count.
    LakeCount,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::AlbionCpue, Site::BonnevilleCount, Site::LakeCount];

    /// Identifier used on the command line and in log messages.
    pub fn key(&self) -> &'static str {
        match self {
            Site::AlbionCpue => "albion",
            Site::BonnevilleCount => "bonneville",
            Site::LakeCount => "lake",
        }
    }

    /// Prefix for wide-table column names (`alb2023`, `alb_hist`).
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Site::AlbionCpue => "alb",
            Site::BonnevilleCount => "bon",
            Site::LakeCount => "lake",
        }
    }

    /// Decimal places carried by baselines: rates keep 2, counts keep 1.
    pub fn precision(&self) -> u32 {
        match self {
            Site::AlbionCpue => 2,
            Site::BonnevilleCount | Site::LakeCount => 1,
        }
    }

    /// First year with a published record.
    pub fn first_year(&self) -> i32 {
        match self {
            Site::AlbionCpue => 1980,
            Site::BonnevilleCount => 1939,
            Site::LakeCount => 2024,
        }
    }

    /// Reject years outside this site's record.
    pub fn check_year(&self, year: i32) -> Result<()> {
        if year < self.first_year() || year > LAST_SUPPORTED_YEAR {
            return Err(SeriesError::Configuration(format!(
                "year {year} is outside the {} record ({}..={LAST_SUPPORTED_YEAR})",
                self.key(),
                self.first_year()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Site {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "albion" | "albion-cpue" => Ok(Site::AlbionCpue),
            "bonneville" | "bon" => Ok(Site::BonnevilleCount),
            "lake" | "lake-washington" => Ok(Site::LakeCount),
            other => Err(SeriesError::Configuration(format!("unknown site: {other}"))),
        }
    }
}
