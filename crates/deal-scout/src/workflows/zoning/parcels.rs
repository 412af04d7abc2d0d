use super::{ReferenceTableError, ZoningLookup};
use crate::workflows::listings::{clean_text, decode_cell, find_column, parse_decimal, Coordinates};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Grid resolution of the index: 1e-5 degrees, roughly a metre.
const GRID_SCALE: f64 = 100_000.0;

/// Parcel centroids with their zoning designation, matched on rounded coordinates.
#[derive(Debug, Clone, Default)]
pub struct ParcelZoningIndex {
    parcels: HashMap<(i64, i64), String>,
}

impl ParcelZoningIndex {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Expects `Latitude`, `Longitude` and `ZoningCode` columns. Rows without a
    /// usable point or code are skipped; the first code seen for a cell wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader.byte_headers()?.iter().map(decode_cell).collect();

        let lat = find_column(&headers, &["Latitude", "lat"])
            .ok_or(ReferenceTableError::MissingColumn("Latitude"))?;
        let lon = find_column(&headers, &["Longitude", "lon", "lng"])
            .ok_or(ReferenceTableError::MissingColumn("Longitude"))?;
        let zone = find_column(&headers, &["ZoningCode", "Zoning", "ZONE_CLASS"])
            .ok_or(ReferenceTableError::MissingColumn("ZoningCode"))?;

        let mut index = Self::default();
        for result in csv_reader.byte_records() {
            let record = result?;
            let cell = |column: usize| record.get(column).map(decode_cell).unwrap_or_default();
            let point = match (parse_decimal(&cell(lat)), parse_decimal(&cell(lon))) {
                (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
                _ => None,
            };
            let code = clean_text(&cell(zone));

            if let Some(point) = point.filter(|_| !code.is_empty()) {
                index.insert(point, code);
            }
        }

        Ok(index)
    }

    pub fn insert(&mut self, location: Coordinates, zoning_code: impl Into<String>) {
        self.parcels
            .entry(grid_key(location))
            .or_insert_with(|| zoning_code.into());
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}

impl ZoningLookup for ParcelZoningIndex {
    fn zoning_code(&self, location: Coordinates) -> Option<String> {
        self.parcels.get(&grid_key(location)).cloned()
    }
}

fn grid_key(location: Coordinates) -> (i64, i64) {
    (
        (location.latitude * GRID_SCALE).round() as i64,
        (location.longitude * GRID_SCALE).round() as i64,
    )
}
