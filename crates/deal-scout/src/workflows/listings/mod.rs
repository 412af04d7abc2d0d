//! MLS listing exports: reading the uploaded CSV and writing the enriched one.

mod columns;
pub mod domain;
pub mod export;
mod parser;

pub use domain::{Coordinates, ListingRecord, StreetAddress};
pub use export::{write_csv, DERIVED_COLUMNS};

use std::io::Read;
use std::path::Path;

pub(crate) use columns::find_column;
pub(crate) use parser::{clean_text, decode_cell, normalize_key, parse_decimal};

/// Failure to read an export as a whole. Individual bad cells never end up here.
#[derive(Debug, thiserror::Error)]
pub enum ListingImportError {
    #[error("failed to read listing export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid listing CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("listing export has no header row")]
    MissingHeader,
}

/// One uploaded row: the cells as exported plus their normalized reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    /// 1-based line in the source file, header included.
    pub line: usize,
    pub values: Vec<String>,
    pub record: ListingRecord,
}

/// Parsed export. Rows keep the width of `headers` so they can be written back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingTable {
    pub headers: Vec<String>,
    /// Core columns (price, lot size, coordinates) absent from the header row.
    pub missing_columns: Vec<&'static str>,
    pub rows: Vec<ListingRow>,
}

impl ListingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Case-insensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        find_column(&self.headers, &[name])
    }
}

pub struct ListingImporter;

impl ListingImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ListingTable, ListingImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ListingTable, ListingImportError> {
        let table = parser::parse_table(reader)?;
        if table.headers.iter().all(|header| header.is_empty()) {
            return Err(ListingImportError::MissingHeader);
        }

        if !table.missing_columns.is_empty() {
            tracing::warn!(
                missing = ?table.missing_columns,
                "listing export lacks core columns; affected rows will be excluded"
            );
        }

        Ok(table)
    }
}
