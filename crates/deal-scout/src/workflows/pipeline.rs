use crate::workflows::enrichment::{EnrichedListing, ListingFilter, MetricsEngine};
use crate::workflows::listings::{Coordinates, ListingRow, ListingTable};
use crate::workflows::zoning::{AddressResolver, ZoningLookup};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a listing's zoning designation comes from.
#[derive(Clone)]
pub enum ZoningSource {
    /// A column of the uploaded export that an upstream spatial join already filled.
    Column(String),
    Lookup(Arc<dyn ZoningLookup>),
}

/// An enriched listing together with the source cells it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    pub line: usize,
    #[serde(skip)]
    pub values: Vec<String>,
    pub address: Option<String>,
    /// Coordinates used for the zoning lookup, geocoded when the export had none.
    pub location: Option<Coordinates>,
    pub listing: EnrichedListing,
}

/// Upload-to-table pass: locate each row, resolve its zoning, compute metrics.
#[derive(Clone)]
pub struct DealScoutPipeline {
    engine: MetricsEngine,
    zoning: ZoningSource,
    resolver: Option<Arc<dyn AddressResolver>>,
}

impl DealScoutPipeline {
    pub fn new(engine: MetricsEngine, zoning: ZoningSource) -> Self {
        Self {
            engine,
            zoning,
            resolver: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Same engine and geocoder, different zoning source.
    pub fn with_zoning(&self, zoning: ZoningSource) -> Self {
        Self {
            zoning,
            ..self.clone()
        }
    }

    pub fn engine(&self) -> &MetricsEngine {
        &self.engine
    }

    /// Every row of `table` yields exactly one [`EnrichedRow`], in order.
    pub fn run(&self, table: &ListingTable) -> Vec<EnrichedRow> {
        let zoning_column = match &self.zoning {
            ZoningSource::Column(name) => {
                let index = table.column_index(name);
                if index.is_none() {
                    tracing::warn!(column = %name, "zoning column not found; every listing will be unzoned");
                }
                index
            }
            ZoningSource::Lookup(_) => None,
        };

        let rows: Vec<EnrichedRow> = table
            .rows
            .iter()
            .map(|row| self.enrich_row(row, zoning_column))
            .collect();

        info!(
            jurisdiction = %self.engine.rules().jurisdiction,
            rows = rows.len(),
            excluded = rows.iter().filter(|row| row.listing.is_excluded()).count(),
            "listing batch enriched"
        );
        rows
    }

    /// [`run`](Self::run) followed by `filter`, preserving order.
    pub fn run_filtered(&self, table: &ListingTable, filter: &ListingFilter) -> Vec<EnrichedRow> {
        self.run(table)
            .into_iter()
            .filter(|row| filter.matches(&row.listing))
            .collect()
    }

    fn enrich_row(&self, row: &ListingRow, zoning_column: Option<usize>) -> EnrichedRow {
        let address = row.record.display_address();
        let location = self.locate(row, address.as_deref());

        let zoning = location.map(|point| {
            let raw_code = match &self.zoning {
                ZoningSource::Column(_) => zoning_column
                    .and_then(|index| row.values.get(index))
                    .cloned(),
                ZoningSource::Lookup(lookup) => lookup.zoning_code(point),
            };
            self.engine.rules().zoning_result(raw_code.as_deref())
        });

        let listing = self.engine.enrich(&row.record, zoning.as_ref());
        if let Some(reason) = listing.exclusion_reason {
            debug!(line = row.line, %reason, "listing excluded from enrichment");
        }

        EnrichedRow {
            line: row.line,
            values: row.values.clone(),
            address,
            location,
            listing,
        }
    }

    fn locate(&self, row: &ListingRow, address: Option<&str>) -> Option<Coordinates> {
        row.record.coordinates().or_else(|| {
            let resolver = self.resolver.as_ref()?;
            resolver.resolve(address?)
        })
    }
}
