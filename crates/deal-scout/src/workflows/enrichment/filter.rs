use super::EnrichedListing;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Table/map filter over enriched listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    /// Ceiling on price per unit. Listings without one never pass a ceiling.
    pub max_price_per_unit: Option<f64>,
    /// Allow-list of zoning codes; empty means every zone.
    pub zoning_codes: BTreeSet<String>,
    /// Drop excluded rows and rows outside every known zone.
    pub resolved_only: bool,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        self.max_price_per_unit.is_none() && self.zoning_codes.is_empty() && !self.resolved_only
    }

    pub fn matches(&self, listing: &EnrichedListing) -> bool {
        if self.resolved_only
            && (listing.is_excluded()
                || listing
                    .zoning_code
                    .as_ref()
                    .map_or(true, |code| code.is_unknown()))
        {
            return false;
        }

        if let Some(ceiling) = self.max_price_per_unit {
            match listing.price_per_unit {
                Some(price_per_unit) if price_per_unit <= ceiling => {}
                _ => return false,
            }
        }

        if !self.zoning_codes.is_empty() {
            let Some(code) = listing.zoning_code.as_ref() else {
                return false;
            };
            let wanted = |candidate: &str| {
                self.zoning_codes
                    .iter()
                    .any(|allowed| allowed.trim().eq_ignore_ascii_case(candidate))
            };
            if !wanted(code.as_str()) {
                return false;
            }
        }

        true
    }
}
