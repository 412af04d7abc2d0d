use super::rules::round_to_cents;
use super::EnrichedListing;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const STRONG_DEAL_CEILING: f64 = 300_000.0;
const FAIR_DEAL_CEILING: f64 = 600_000.0;

/// Price-per-unit band used for map markers and listing views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DealTier {
    Strong,
    Fair,
    Weak,
}

impl DealTier {
    pub fn classify(price_per_unit: Option<f64>) -> Option<Self> {
        let value = price_per_unit?;
        Some(if value < STRONG_DEAL_CEILING {
            DealTier::Strong
        } else if value < FAIR_DEAL_CEILING {
            DealTier::Fair
        } else {
            DealTier::Weak
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DealTier::Strong => "Strong",
            DealTier::Fair => "Fair",
            DealTier::Weak => "Weak",
        }
    }
}

/// Batch-level counts reported next to the enriched table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub jurisdiction: String,
    pub generated_at: DateTime<Utc>,
    pub total_rows: usize,
    pub enriched: usize,
    pub excluded: BTreeMap<String, usize>,
    pub unknown_zoning: usize,
    pub sb9_eligible: usize,
    pub median_price_per_unit: Option<f64>,
    pub zoning_counts: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn build<'a, I>(
        jurisdiction: impl Into<String>,
        listings: I,
        generated_at: DateTime<Utc>,
    ) -> Self
    where
        I: IntoIterator<Item = &'a EnrichedListing>,
    {
        let mut total_rows = 0;
        let mut excluded = BTreeMap::new();
        let mut zoning_counts = BTreeMap::new();
        let mut unknown_zoning = 0;
        let mut sb9_eligible = 0;
        let mut prices = Vec::new();

        for listing in listings {
            total_rows += 1;
            if let Some(reason) = listing.exclusion_reason {
                *excluded.entry(reason.label().to_string()).or_insert(0) += 1;
            }
            match &listing.zoning_code {
                Some(code) if code.is_unknown() => unknown_zoning += 1,
                Some(code) => *zoning_counts.entry(code.to_string()).or_insert(0) += 1,
                None => {}
            }
            if listing.sb9_eligible {
                sb9_eligible += 1;
            }
            if let Some(price) = listing.price_per_unit {
                prices.push(price);
            }
        }

        let excluded_total: usize = excluded.values().sum();
        Self {
            jurisdiction: jurisdiction.into(),
            generated_at,
            total_rows,
            enriched: total_rows - excluded_total,
            excluded,
            unknown_zoning,
            sb9_eligible,
            median_price_per_unit: median(&mut prices),
            zoning_counts,
        }
    }

    pub fn excluded_total(&self) -> usize {
        self.excluded.values().sum()
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let value = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Some(round_to_cents(value))
}
