//! Derived real-estate metrics for a single listing: buildable units, price
//! per unit, and SB-9 lot-split eligibility.

mod config;
mod filter;
mod rules;
mod summary;

pub use config::{JurisdictionRules, RulesError};
pub use filter::ListingFilter;
pub use rules::{resolve_max_units, resolve_price_per_unit, resolve_sb9_eligibility};
pub use summary::{BatchSummary, DealTier};

use crate::workflows::listings::ListingRecord;
use crate::workflows::zoning::{ZoningCode, ZoningLookupResult};
use serde::{Serialize, Serializer};
use std::fmt;

/// Why a row carries no derived metrics. The row itself stays in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExclusionReason {
    UnresolvableLocation,
    InvalidPrice,
    InvalidLotSize,
}

impl ExclusionReason {
    pub fn label(&self) -> &'static str {
        match self {
            ExclusionReason::UnresolvableLocation => "unresolvable location",
            ExclusionReason::InvalidPrice => "invalid price",
            ExclusionReason::InvalidLotSize => "invalid lot size",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExclusionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One processed listing. Built once by [`MetricsEngine::enrich`] and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedListing {
    pub record: ListingRecord,
    /// `None` only when the location could not be resolved, so zoning was never looked up.
    pub zoning_code: Option<ZoningCode>,
    pub price_per_unit: Option<f64>,
    pub max_units: Option<u32>,
    pub sb9_eligible: bool,
    pub exclusion_reason: Option<ExclusionReason>,
}

impl EnrichedListing {
    fn excluded(
        record: &ListingRecord,
        zoning_code: Option<ZoningCode>,
        reason: ExclusionReason,
    ) -> Self {
        Self {
            record: record.clone(),
            zoning_code,
            price_per_unit: None,
            max_units: None,
            sb9_eligible: false,
            exclusion_reason: Some(reason),
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.exclusion_reason.is_some()
    }
}

/// Applies a validated [`JurisdictionRules`] table to listings. Holds no
/// per-row state, so one engine can serve any number of batches.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    rules: JurisdictionRules,
}

impl MetricsEngine {
    /// Refuses to build from a rule set that fails validation.
    pub fn new(rules: JurisdictionRules) -> Result<Self, RulesError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &JurisdictionRules {
        &self.rules
    }

    /// `zoning` is `None` when the caller could not place the listing on the map
    /// (no coordinates and no geocodable address).
    pub fn enrich(
        &self,
        record: &ListingRecord,
        zoning: Option<&ZoningLookupResult>,
    ) -> EnrichedListing {
        let located = record.coordinates().is_some() || record.display_address().is_some();
        let zoning = match zoning {
            Some(result) if located => result,
            _ => {
                return EnrichedListing::excluded(
                    record,
                    None,
                    ExclusionReason::UnresolvableLocation,
                )
            }
        };
        let zoning_code = zoning.zoning_code.clone();

        let Some(lot_size) = record.lot_size_sq_ft.filter(|lot| lot.is_finite() && *lot > 0.0)
        else {
            return EnrichedListing::excluded(
                record,
                Some(zoning_code),
                ExclusionReason::InvalidLotSize,
            );
        };
        let Some(price) = record.price.filter(|price| price.is_finite() && *price > 0.0) else {
            return EnrichedListing::excluded(
                record,
                Some(zoning_code),
                ExclusionReason::InvalidPrice,
            );
        };

        let max_units = resolve_max_units(lot_size, zoning.min_lot_area_per_unit_sq_ft)
            .map(|units| match self.rules.max_units_cap {
                Some(cap) => units.min(cap),
                None => units,
            });
        let price_per_unit = resolve_price_per_unit(price, max_units);
        let sb9_eligible = resolve_sb9_eligibility(lot_size, &zoning_code, &self.rules);

        EnrichedListing {
            record: record.clone(),
            zoning_code: Some(zoning_code),
            price_per_unit,
            max_units,
            sb9_eligible,
            exclusion_reason: None,
        }
    }

    /// One output per input, in input order.
    pub fn enrich_batch<'a, I>(&self, items: I) -> Vec<EnrichedListing>
    where
        I: IntoIterator<Item = (&'a ListingRecord, Option<&'a ZoningLookupResult>)>,
    {
        items
            .into_iter()
            .map(|(record, zoning)| self.enrich(record, zoning))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn engine() -> MetricsEngine {
        MetricsEngine::new(JurisdictionRules {
            jurisdiction: "Test City".to_string(),
            eligible_zoning_codes: BTreeSet::from(["R1".to_string()]),
            min_split_parcel_sq_ft: 1200.0,
            density: BTreeMap::from([("R1".to_string(), 5000.0), ("RD1.5".to_string(), 1500.0)]),
            fallback_min_lot_area_per_unit_sq_ft: None,
            max_units_cap: Some(20),
        })
        .expect("valid rules")
    }

    fn record(price: f64, lot: f64) -> ListingRecord {
        ListingRecord {
            price: Some(price),
            lot_size_sq_ft: Some(lot),
            latitude: Some(34.05),
            longitude: Some(-118.24),
            ..ListingRecord::default()
        }
    }

    fn zoning(code: &str, density: f64) -> ZoningLookupResult {
        ZoningLookupResult::new(ZoningCode::parse(code), Some(density))
    }

    #[test]
    fn enrich_computes_worked_example() {
        let listing = engine().enrich(&record(1_000_000.0, 6000.0), Some(&zoning("RD1.5-1", 1500.0)));

        assert_eq!(listing.max_units, Some(4));
        assert_eq!(listing.price_per_unit, Some(250_000.0));
        assert!(!listing.sb9_eligible);
        assert!(listing.exclusion_reason.is_none());
    }

    #[test]
    fn enrich_marks_sb9_for_eligible_zone() {
        let listing = engine().enrich(&record(900_000.0, 2400.0), Some(&zoning("R1-1", 5000.0)));

        assert!(listing.sb9_eligible);
        assert_eq!(listing.max_units, Some(0));
        assert!(listing.price_per_unit.is_none());
    }

    #[test]
    fn unknown_zoning_leaves_metrics_undefined_without_excluding() {
        let listing = engine().enrich(
            &record(1_000_000.0, 6000.0),
            Some(&ZoningLookupResult::unknown()),
        );

        assert_eq!(listing.zoning_code, Some(ZoningCode::Unknown));
        assert!(listing.max_units.is_none());
        assert!(listing.price_per_unit.is_none());
        assert!(!listing.sb9_eligible);
        assert!(listing.exclusion_reason.is_none());
    }

    #[test]
    fn missing_location_is_excluded() {
        let mut unlocated = record(1_000_000.0, 6000.0);
        unlocated.latitude = None;
        unlocated.longitude = None;

        let listing = engine().enrich(&unlocated, None);
        assert_eq!(listing.exclusion_reason, Some(ExclusionReason::UnresolvableLocation));
        assert!(listing.zoning_code.is_none());
        assert!(listing.max_units.is_none());
        assert!(!listing.sb9_eligible);

        // A zoning answer cannot rescue a row with neither coordinates nor address.
        let listing = engine().enrich(&unlocated, Some(&zoning("R1", 5000.0)));
        assert_eq!(listing.exclusion_reason, Some(ExclusionReason::UnresolvableLocation));
    }

    #[test]
    fn malformed_numbers_are_annotated() {
        let mut no_lot = record(1_000_000.0, 6000.0);
        no_lot.lot_size_sq_ft = None;
        let listing = engine().enrich(&no_lot, Some(&zoning("R1", 5000.0)));
        assert_eq!(listing.exclusion_reason, Some(ExclusionReason::InvalidLotSize));
        assert_eq!(listing.zoning_code, Some(ZoningCode::parse("R1")));

        let mut no_price = record(1_000_000.0, 6000.0);
        no_price.price = None;
        let listing = engine().enrich(&no_price, Some(&zoning("R1", 5000.0)));
        assert_eq!(listing.exclusion_reason, Some(ExclusionReason::InvalidPrice));
        assert!(listing.max_units.is_none());
    }

    #[test]
    fn unit_cap_bounds_max_units() {
        let listing = engine().enrich(&record(4_000_000.0, 40_000.0), Some(&zoning("R5", 200.0)));
        assert_eq!(listing.max_units, Some(20));
        assert_eq!(listing.price_per_unit, Some(200_000.0));
    }

    #[test]
    fn enrich_is_deterministic() {
        let engine = engine();
        let input = record(1_234_567.0, 7300.0);
        let lookup = zoning("RD1.5", 1500.0);

        let first = serde_json::to_vec(&engine.enrich(&input, Some(&lookup))).expect("json");
        let second = serde_json::to_vec(&engine.enrich(&input, Some(&lookup))).expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn batch_preserves_count_and_order() {
        let engine = engine();
        let records = vec![
            record(1_000_000.0, 6000.0),
            ListingRecord::default(),
            record(500_000.0, 3000.0),
        ];
        let lookup = zoning("RD1.5", 1500.0);
        let zonings = [Some(&lookup), None, Some(&lookup)];

        let enriched = engine.enrich_batch(records.iter().zip(zonings));

        assert_eq!(enriched.len(), records.len());
        assert_eq!(enriched[0].record, records[0]);
        assert!(enriched[1].is_excluded());
        assert_eq!(enriched[2].max_units, Some(2));
    }

    #[test]
    fn engine_rejects_invalid_rules() {
        let mut rules = engine().rules().clone();
        rules.eligible_zoning_codes.clear();
        assert!(matches!(
            MetricsEngine::new(rules),
            Err(RulesError::NoEligibleZones)
        ));
    }
}
