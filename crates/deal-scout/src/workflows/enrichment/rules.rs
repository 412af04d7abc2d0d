use super::config::JurisdictionRules;
use crate::workflows::zoning::ZoningCode;

/// Dwelling units the lot supports under its zone's lot-area-per-unit rule.
///
/// `None` when the density is unknown. A lot below the per-unit area yields
/// `Some(0)`: a valid answer meaning the lot is non-conforming for added units.
pub fn resolve_max_units(lot_size_sq_ft: f64, min_lot_area_per_unit_sq_ft: Option<f64>) -> Option<u32> {
    let per_unit = min_lot_area_per_unit_sq_ft.filter(|area| area.is_finite() && *area > 0.0)?;
    if !lot_size_sq_ft.is_finite() || lot_size_sq_ft < per_unit {
        return Some(0);
    }

    let units = (lot_size_sq_ft / per_unit).floor();
    // Float-to-int `as` saturates, so an absurd ratio cannot wrap.
    Some((units as u32).max(1))
}

/// Listing price split across the buildable units, to the cent.
pub fn resolve_price_per_unit(price: f64, max_units: Option<u32>) -> Option<f64> {
    let units = max_units.filter(|units| *units > 0)?;
    if !price.is_finite() {
        return None;
    }
    Some(round_to_cents(price / f64::from(units)))
}

/// SB-9 lot-split eligibility: an eligible zone and room for two parcels of
/// at least `min_split_parcel_sq_ft` each. Unknown zoning is never eligible.
pub fn resolve_sb9_eligibility(
    lot_size_sq_ft: f64,
    zoning_code: &ZoningCode,
    rules: &JurisdictionRules,
) -> bool {
    if zoning_code.is_unknown() || !lot_size_sq_ft.is_finite() {
        return false;
    }
    rules.is_eligible_zone(zoning_code) && lot_size_sq_ft >= 2.0 * rules.min_split_parcel_sq_ft
}

/// Banker's rounding to two decimals.
pub(crate) fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn rules(min_split_parcel_sq_ft: f64) -> JurisdictionRules {
        JurisdictionRules {
            jurisdiction: "Test City".to_string(),
            eligible_zoning_codes: BTreeSet::from(["R1".to_string(), "RS".to_string()]),
            min_split_parcel_sq_ft,
            density: BTreeMap::new(),
            fallback_min_lot_area_per_unit_sq_ft: None,
            max_units_cap: None,
        }
    }

    #[test]
    fn max_units_floors_the_ratio() {
        assert_eq!(resolve_max_units(6000.0, Some(1500.0)), Some(4));
        assert_eq!(resolve_max_units(7499.0, Some(2500.0)), Some(2));
        assert_eq!(resolve_max_units(1500.0, Some(1500.0)), Some(1));
    }

    #[test]
    fn max_units_is_zero_for_undersized_lots_and_none_without_density() {
        assert_eq!(resolve_max_units(1200.0, Some(5000.0)), Some(0));
        assert_eq!(resolve_max_units(6000.0, None), None);
    }

    #[test]
    fn max_units_is_monotone_in_lot_size() {
        let per_unit = Some(2300.0);
        let mut previous = 0;
        for step in 0..400 {
            let lot = 250.0 * f64::from(step);
            let units = resolve_max_units(lot, per_unit).expect("density known");
            assert!(units >= previous, "lot {lot} dropped from {previous} to {units}");
            previous = units;
        }
    }

    #[test]
    fn price_per_unit_matches_worked_example() {
        assert_eq!(resolve_price_per_unit(1_000_000.0, Some(4)), Some(250_000.0));
    }

    #[test]
    fn price_per_unit_is_omitted_for_zero_or_unknown_units() {
        assert_eq!(resolve_price_per_unit(1_000_000.0, Some(0)), None);
        assert_eq!(resolve_price_per_unit(1_000_000.0, None), None);
    }

    #[test]
    fn price_per_unit_rounds_half_to_even() {
        assert_eq!(round_to_cents(0.125), 0.12);
        assert_eq!(round_to_cents(0.375), 0.38);
        assert_eq!(resolve_price_per_unit(100.0, Some(3)), Some(33.33));
        assert_eq!(resolve_price_per_unit(200.0, Some(3)), Some(66.67));
    }

    #[test]
    fn price_per_unit_times_units_stays_within_rounding_of_price() {
        for (price, units) in [
            (1_000_000.0, 3),
            (849_000.0, 7),
            (1_234_567.0, 11),
            (999_999.0, 20),
        ] {
            let per_unit = resolve_price_per_unit(price, Some(units)).expect("defined");
            let drift = (per_unit * f64::from(units) - price).abs();
            assert!(drift <= 0.005 * f64::from(units) + 1e-6, "{price}/{units} drifted {drift}");
        }
        let per_unit = resolve_price_per_unit(1_000_000.0, Some(3)).expect("defined");
        assert!((per_unit * 3.0 - 1_000_000.0).abs() <= 0.01 + 1e-6);
    }

    #[test]
    fn sb9_requires_eligible_zone_and_two_parcels() {
        let rules = rules(1200.0);
        assert!(resolve_sb9_eligibility(2400.0, &ZoningCode::parse("R1"), &rules));
        assert!(resolve_sb9_eligibility(2400.0, &ZoningCode::parse("R1-1"), &rules));
        assert!(!resolve_sb9_eligibility(2399.0, &ZoningCode::parse("R1"), &rules));
        assert!(!resolve_sb9_eligibility(10_000.0, &ZoningCode::parse("C2-1"), &rules));
    }

    #[test]
    fn sb9_is_false_for_unknown_zoning_at_any_size() {
        let rules = rules(1200.0);
        for lot in [0.0, 2400.0, 1_000_000.0] {
            assert!(!resolve_sb9_eligibility(lot, &ZoningCode::Unknown, &rules));
        }
    }
}
