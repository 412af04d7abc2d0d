use super::columns::{ColumnLayout, LotSizeColumn, SQ_FT_PER_ACRE};
use super::domain::{ListingRecord, StreetAddress};
use super::{ListingRow, ListingTable};
use std::io::Read;

const NULL_MARKERS: &[&str] = &["nan", "none", "null", "<na>", "n/a"];

pub(crate) fn parse_table<R: Read>(reader: R) -> Result<ListingTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|header| decode_cell(header).replace(['\u{feff}', '\u{200b}'], ""))
        .collect();
    let layout = ColumnLayout::resolve(&headers);

    let mut rows = Vec::new();
    for (index, result) in csv_reader.byte_records().enumerate() {
        let record = result?;
        let mut values: Vec<String> = record.iter().map(decode_cell).collect();
        values.resize(headers.len(), String::new());

        // Quoted cells may span lines, so the record index is only a fallback.
        let line = record
            .position()
            .and_then(|position| usize::try_from(position.line()).ok())
            .unwrap_or(index + 2);

        let listing = parse_listing(&layout, &values);
        rows.push(ListingRow {
            line,
            values,
            record: listing,
        });
    }

    Ok(ListingTable {
        headers,
        missing_columns: layout.missing(),
        rows,
    })
}

fn parse_listing(layout: &ColumnLayout, values: &[String]) -> ListingRecord {
    let cell = |column: Option<usize>| column.and_then(|index| values.get(index));
    let text = |column: Option<usize>| cell(column).map(|value| clean_text(value)).unwrap_or_default();

    let lot_size_sq_ft = match layout.lot_size {
        Some(LotSizeColumn::SquareFeet(index)) => cell(Some(index)).and_then(|v| parse_positive(v)),
        Some(LotSizeColumn::Acres(index)) => cell(Some(index))
            .and_then(|v| parse_positive(v))
            .map(|acres| acres * SQ_FT_PER_ACRE),
        None => None,
    };

    ListingRecord {
        price: cell(layout.price).and_then(|v| parse_positive(v)),
        lot_size_sq_ft,
        latitude: cell(layout.latitude).and_then(|v| parse_decimal(v)),
        longitude: cell(layout.longitude).and_then(|v| parse_decimal(v)),
        address: StreetAddress {
            street_number: text(layout.street_number),
            street_dir_prefix: text(layout.street_dir_prefix),
            street_name: text(layout.street_name),
            street_suffix: text(layout.street_suffix),
            street_dir_suffix: text(layout.street_dir_suffix),
        },
    }
}

pub(crate) fn normalize_header(value: &str) -> String {
    normalize_key(&value.replace(['\u{feff}', '\u{200b}'], ""))
}

/// Lookup key for free text such as addresses: collapsed whitespace, lower-case.
pub(crate) fn normalize_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Exports from older MLS tools are often Latin-1; undecodable bytes become U+FFFD
/// instead of failing the file.
pub(crate) fn decode_cell(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Trims the cell and blanks out the textual null markers spreadsheets emit.
pub(crate) fn clean_text(value: &str) -> String {
    let trimmed = value.trim();
    if NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Reads `$1,250,000.00`-style cells. Blank and null markers are `None`.
pub(crate) fn parse_decimal(value: &str) -> Option<f64> {
    let cleaned: String = clean_text(value)
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

pub(crate) fn parse_positive(value: &str) -> Option<f64> {
    parse_decimal(value).filter(|parsed| *parsed > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_decimal_strips_currency_formatting() {
        assert_eq!(parse_decimal("$1,250,000.00"), Some(1_250_000.0));
        assert_eq!(parse_decimal(" 34.0522 "), Some(34.0522));
        assert_eq!(parse_decimal("-118.2437"), Some(-118.2437));
        assert_eq!(parse_decimal("nan"), None);
        assert_eq!(parse_decimal("<NA>"), None);
        assert_eq!(parse_decimal("call agent"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn parse_positive_rejects_zero_and_negative() {
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("-5"), None);
        assert_eq!(parse_positive("6000"), Some(6000.0));
    }

    #[test]
    fn clean_text_blanks_null_markers() {
        assert_eq!(clean_text(" None "), "");
        assert_eq!(clean_text("Cochran"), "Cochran");
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let csv = "CurrentPrice,LotSizeSquareFeet,Latitude,Longitude,StreetName\n900000,5000\n";
        let table = parse_table(Cursor::new(csv)).expect("parse");

        let row = &table.rows[0];
        assert_eq!(row.values.len(), 5);
        assert_eq!(row.line, 2);
        assert_eq!(row.record.price, Some(900_000.0));
        assert!(row.record.latitude.is_none());
        assert_eq!(row.record.address.street_name, "");
    }

    #[test]
    fn line_numbers_follow_multiline_cells() {
        let csv = "CurrentPrice,Remarks\n900000,\"great\nlot\nhere\"\n750000,plain\n";
        let table = parse_table(Cursor::new(csv)).expect("parse");

        assert_eq!(table.rows[0].line, 2);
        assert_eq!(table.rows[0].values[1], "great\nlot\nhere");
        assert_eq!(table.rows[1].line, 5);
    }

    #[test]
    fn undecodable_bytes_are_replaced() {
        assert_eq!(decode_cell(b"Caf\xe9"), "Caf\u{fffd}");
        assert_eq!(decode_cell("Café".as_bytes()), "Café");
    }

    #[test]
    fn keys_collapse_spacing_and_case() {
        assert_eq!(normalize_key("  2622  S Cochran\tAVE "), "2622 s cochran ave");
    }

    #[test]
    fn lot_size_in_acres_is_converted() {
        let csv = "ListPrice,LotSizeAcres,lat,lon\n500000,0.25,34.1,-118.3\n";
        let table = parse_table(Cursor::new(csv)).expect("parse");

        assert_eq!(table.rows[0].record.lot_size_sq_ft, Some(10_890.0));
        assert!(table.missing_columns.is_empty());
    }
}
