//! Boundary with the zoning and geocoding collaborators.
//!
//! The spatial join itself lives outside this crate. What comes back from it is
//! either a zoning designation or nothing (the point is outside every zone), and
//! both answers are valid.

mod address_book;
mod parcels;

pub use address_book::AddressBook;
pub use parcels::ParcelZoningIndex;

use crate::workflows::listings::Coordinates;
use serde::{Serialize, Serializer};
use std::fmt;

const UNKNOWN_LABEL: &str = "unknown";

/// Jurisdiction-assigned designation for the parcel a listing sits on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZoningCode {
    Known(String),
    Unknown,
}

impl ZoningCode {
    /// Blank values and the literal `unknown` both map to [`ZoningCode::Unknown`].
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_LABEL) {
            Self::Unknown
        } else {
            Self::Known(trimmed.to_string())
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Base zone without the height district, upper-cased: `rd1.5-1` -> `RD1.5`.
    pub fn base_zone(&self) -> Option<String> {
        match self {
            Self::Known(code) => code
                .split('-')
                .next()
                .map(|base| base.trim().to_ascii_uppercase())
                .filter(|base| !base.is_empty()),
            Self::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(code) => code,
            Self::Unknown => UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for ZoningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ZoningCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// What the zoning collaborator reports for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoningLookupResult {
    pub zoning_code: ZoningCode,
    pub min_lot_area_per_unit_sq_ft: Option<f64>,
}

impl ZoningLookupResult {
    pub fn new(zoning_code: ZoningCode, min_lot_area_per_unit_sq_ft: Option<f64>) -> Self {
        // An unknown zone never carries a density.
        let min_lot_area_per_unit_sq_ft = match zoning_code {
            ZoningCode::Unknown => None,
            ZoningCode::Known(_) => min_lot_area_per_unit_sq_ft,
        };
        Self {
            zoning_code,
            min_lot_area_per_unit_sq_ft,
        }
    }

    pub fn unknown() -> Self {
        Self::new(ZoningCode::Unknown, None)
    }
}

/// Failure to load a parcel index or address book.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceTableError {
    #[error("failed to read reference table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference table CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("reference table is missing the {0} column")]
    MissingColumn(&'static str),
}

/// Spatial lookup seam: the zoning designation covering a point, if any.
pub trait ZoningLookup: Send + Sync {
    fn zoning_code(&self, location: Coordinates) -> Option<String>;
}

/// Geocoder seam used for rows exported without coordinates.
pub trait AddressResolver: Send + Sync {
    fn resolve(&self, address: &str) -> Option<Coordinates>;
}
