use crate::workflows::zoning::{ZoningCode, ZoningLookupResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// Jurisdiction rule table: which zones may use an SB-9 lot split, the minimum
/// parcel size a split must leave behind, and the density per base zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionRules {
    pub jurisdiction: String,
    pub eligible_zoning_codes: BTreeSet<String>,
    pub min_split_parcel_sq_ft: f64,
    /// Base zone -> minimum lot area per dwelling unit.
    #[serde(default)]
    pub density: BTreeMap<String, f64>,
    /// Applied to known zones that are missing from `density`.
    #[serde(default)]
    pub fallback_min_lot_area_per_unit_sq_ft: Option<f64>,
    #[serde(default)]
    pub max_units_cap: Option<u32>,
}

impl JurisdictionRules {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RulesError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RulesError> {
        let mut rules: Self = serde_json::from_reader(reader)?;
        rules.normalize();
        rules.validate()?;
        Ok(rules)
    }

    fn normalize(&mut self) {
        self.eligible_zoning_codes = self
            .eligible_zoning_codes
            .iter()
            .map(|code| code.trim().to_ascii_uppercase())
            .collect();
        self.density = std::mem::take(&mut self.density)
            .into_iter()
            .map(|(zone, area)| (zone.trim().to_ascii_uppercase(), area))
            .collect();
    }

    /// Rejects rule sets that would silently misclassify listings.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.eligible_zoning_codes.is_empty() {
            return Err(RulesError::NoEligibleZones);
        }
        if self.eligible_zoning_codes.iter().any(|code| code.trim().is_empty()) {
            return Err(RulesError::BlankZoningCode);
        }
        if !is_positive(self.min_split_parcel_sq_ft) {
            return Err(RulesError::InvalidThreshold {
                field: "min_split_parcel_sq_ft",
                value: self.min_split_parcel_sq_ft,
            });
        }
        if let Some((zone, area)) = self.density.iter().find(|(_, area)| !is_positive(**area)) {
            return Err(RulesError::InvalidDensity {
                zone: zone.clone(),
                value: *area,
            });
        }
        if let Some(fallback) = self.fallback_min_lot_area_per_unit_sq_ft {
            if !is_positive(fallback) {
                return Err(RulesError::InvalidThreshold {
                    field: "fallback_min_lot_area_per_unit_sq_ft",
                    value: fallback,
                });
            }
        }
        if self.max_units_cap == Some(0) {
            return Err(RulesError::ZeroUnitCap);
        }
        Ok(())
    }

    /// Exact code first, then its base zone.
    pub fn is_eligible_zone(&self, zoning_code: &ZoningCode) -> bool {
        let ZoningCode::Known(code) = zoning_code else {
            return false;
        };
        self.eligible_zoning_codes
            .contains(&code.trim().to_ascii_uppercase())
            || zoning_code
                .base_zone()
                .is_some_and(|base| self.eligible_zoning_codes.contains(&base))
    }

    pub fn min_lot_area_per_unit(&self, zoning_code: &ZoningCode) -> Option<f64> {
        let base = zoning_code.base_zone()?;
        self.density
            .get(&base)
            .copied()
            .or(self.fallback_min_lot_area_per_unit_sq_ft)
    }

    /// Turns a raw designation from the zoning collaborator into a lookup result.
    pub fn zoning_result(&self, raw_code: Option<&str>) -> ZoningLookupResult {
        let zoning_code = raw_code.map(ZoningCode::parse).unwrap_or(ZoningCode::Unknown);
        let density = self.min_lot_area_per_unit(&zoning_code);
        ZoningLookupResult::new(zoning_code, density)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Fatal, startup-time problems with the jurisdiction rules.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to read jurisdiction rules: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid jurisdiction rules JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("jurisdiction rules must name at least one SB-9 eligible zoning code")]
    NoEligibleZones,
    #[error("jurisdiction rules contain a blank zoning code")]
    BlankZoningCode,
    #[error("{field} must be a positive number (got {value})")]
    InvalidThreshold { field: &'static str, value: f64 },
    #[error("density for zone {zone} must be a positive number (got {value})")]
    InvalidDensity { zone: String, value: f64 },
    #[error("max_units_cap must be at least 1")]
    ZeroUnitCap,
}
