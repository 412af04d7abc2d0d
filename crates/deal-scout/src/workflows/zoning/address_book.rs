use super::{AddressResolver, ReferenceTableError};
use crate::workflows::listings::{
    clean_text, decode_cell, find_column, normalize_key, parse_decimal, Coordinates,
};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Pre-geocoded addresses, matched after whitespace and case normalization.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: HashMap<String, Coordinates>,
}

impl AddressBook {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Expects `Address`, `Latitude` and `Longitude` columns.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers: Vec<String> = csv_reader.byte_headers()?.iter().map(decode_cell).collect();

        let address = find_column(&headers, &["Address"])
            .ok_or(ReferenceTableError::MissingColumn("Address"))?;
        let lat = find_column(&headers, &["Latitude", "lat"])
            .ok_or(ReferenceTableError::MissingColumn("Latitude"))?;
        let lon = find_column(&headers, &["Longitude", "lon", "lng"])
            .ok_or(ReferenceTableError::MissingColumn("Longitude"))?;

        let mut book = Self::default();
        for result in csv_reader.byte_records() {
            let record = result?;
            let cell = |column: usize| record.get(column).map(decode_cell).unwrap_or_default();
            let text = clean_text(&cell(address));
            let point = match (parse_decimal(&cell(lat)), parse_decimal(&cell(lon))) {
                (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude),
                _ => None,
            };

            if let Some(point) = point.filter(|_| !text.is_empty()) {
                book.insert(&text, point);
            }
        }

        Ok(book)
    }

    pub fn insert(&mut self, address: &str, location: Coordinates) {
        self.entries.insert(normalize_key(address), location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AddressResolver for AddressBook {
    fn resolve(&self, address: &str) -> Option<Coordinates> {
        self.entries.get(&normalize_key(address)).copied()
    }
}
